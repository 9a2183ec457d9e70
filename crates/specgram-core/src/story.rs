//! User story records.
//!
//! A [`StoryRecord`] is extracted from a story header line and carries the
//! acceptance scenarios found beneath it, in document order.

use std::{fmt, ops::Range, str::FromStr};

/// Priority tag attached to a user story header, e.g. `(Priority: P1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
}

impl FromStr for Priority {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            "P4" => Ok(Self::P4),
            _ => Err("Unsupported priority tag"),
        }
    }
}

impl From<Priority> for &'static str {
    fn from(val: Priority) -> Self {
        match val {
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
            Priority::P4 => "P4",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// A single acceptance scenario: `Given <precondition>, When <trigger>, Then <outcome>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRecord {
    precondition: String,
    trigger: String,
    expected_outcome: String,
}

impl ScenarioRecord {
    /// Create a scenario from its three clauses.
    ///
    /// Clauses are stored trimmed. Callers are expected to reject an empty
    /// trigger before constructing the record.
    pub fn new(
        precondition: impl Into<String>,
        trigger: impl Into<String>,
        expected_outcome: impl Into<String>,
    ) -> Self {
        Self {
            precondition: precondition.into().trim().to_string(),
            trigger: trigger.into().trim().to_string(),
            expected_outcome: expected_outcome.into().trim().to_string(),
        }
    }

    pub fn precondition(&self) -> &str {
        &self.precondition
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn expected_outcome(&self) -> &str {
        &self.expected_outcome
    }
}

/// A user story with its literal sequence number, title, priority, and scenarios.
///
/// A story without scenarios is still a valid record; the journey diagram
/// renders it as a single title-only node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRecord {
    sequence_number: u32,
    title: String,
    priority: Priority,
    scenarios: Vec<ScenarioRecord>,
    span: Range<usize>,
}

impl StoryRecord {
    /// Create a story without scenarios.
    pub fn new(sequence_number: u32, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            sequence_number,
            title: title.into(),
            priority,
            scenarios: Vec::new(),
            span: 0..0,
        }
    }

    /// Attach the byte range of the header line.
    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }

    /// Add scenarios to this story, preserving their order.
    pub fn with_scenarios(mut self, scenarios: impl IntoIterator<Item = ScenarioRecord>) -> Self {
        self.scenarios.extend(scenarios);
        self
    }

    /// Append one scenario.
    pub fn push_scenario(&mut self, scenario: ScenarioRecord) {
        self.scenarios.push(scenario);
    }

    /// The number written in the story header. Never renumbered.
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn scenarios(&self) -> &[ScenarioRecord] {
        &self.scenarios
    }

    /// Byte range of the header line in the source document.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Returns `true` if the story has at least one scenario and can be
    /// rendered as a full journey.
    pub fn is_diagrammable(&self) -> bool {
        !self.scenarios.is_empty()
    }
}
