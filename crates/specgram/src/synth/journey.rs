//! Journey flowchart synthesis.
//!
//! Each story becomes a `subgraph`; each acceptance scenario contributes a
//! precondition node, a decision node for its trigger, and a terminal node
//! for its outcome. Scenarios of one story are chained in order.

use std::fmt::Write as _;

use log::{debug, info, trace};

use specgram_core::{
    diagram::{DiagramKind, GeneratedDiagram, ValidationVerdict},
    story::StoryRecord,
};

use crate::{
    config::JourneyConfig,
    document::DocumentModel,
    synth::{
        Synthesizer,
        label::{escape_label, node_letters},
    },
};

/// Renders user stories as a Mermaid flowchart.
#[derive(Debug, Clone)]
pub struct JourneySynthesizer {
    soft_node_limit: usize,
    hard_node_limit: usize,
}

impl JourneySynthesizer {
    pub fn new(config: &JourneyConfig) -> Self {
        Self {
            soft_node_limit: config.soft_node_limit(),
            hard_node_limit: config.hard_node_limit(),
        }
    }

    /// Render `stories` as a flowchart.
    ///
    /// Above the soft node limit the chart flows left to right with each
    /// subgraph laid out top to bottom, so groupings stack side by side.
    /// Nothing is ever truncated; above the hard limit the verdict carries a
    /// warning instead.
    pub fn render(&self, stories: &[StoryRecord]) -> GeneratedDiagram {
        let node_count: usize = stories.iter().map(story_node_count).sum();
        let restructured = node_count > self.soft_node_limit;
        if restructured {
            info!(
                node_count = node_count,
                soft_limit = self.soft_node_limit;
                "Journey diagram above soft limit, stacking groupings"
            );
        }

        let mut markup = String::new();
        let direction = if restructured { "LR" } else { "TD" };
        let _ = writeln!(markup, "flowchart {direction}");
        for (index, story) in stories.iter().enumerate() {
            write_story(&mut markup, index + 1, story, restructured);
        }
        trace!(markup = markup.as_str(); "Journey markup");

        let mut warnings = Vec::new();
        if node_count > self.hard_node_limit {
            warnings.push(format!(
                "journey diagram has {node_count} nodes (limit {}); consider splitting the feature into smaller specifications",
                self.hard_node_limit
            ));
        }

        debug!(stories = stories.len(), node_count = node_count; "Journey diagram rendered");
        GeneratedDiagram::new(
            DiagramKind::Journey,
            markup,
            node_count,
            ValidationVerdict::with_warnings(warnings),
        )
    }
}

impl Synthesizer for JourneySynthesizer {
    fn kind(&self) -> DiagramKind {
        DiagramKind::Journey
    }

    fn synthesize(&self, model: &DocumentModel) -> Option<GeneratedDiagram> {
        if model.stories().is_empty() {
            return None;
        }
        Some(self.render(model.stories()))
    }
}

/// A degraded story is drawn as one title node.
fn story_node_count(story: &StoryRecord) -> usize {
    if story.is_diagrammable() {
        story.scenarios().len() * 3
    } else {
        1
    }
}

fn write_story(markup: &mut String, ordinal: usize, story: &StoryRecord, restructured: bool) {
    let title = escape_label(story.title());
    let _ = writeln!(
        markup,
        "    subgraph story_{ordinal}[\"US{}: {title} ({})\"]",
        story.sequence_number(),
        story.priority()
    );
    if restructured {
        let _ = writeln!(markup, "        direction TB");
    }

    if !story.is_diagrammable() {
        let _ = writeln!(markup, "        {ordinal}_A[\"{title}\"]");
        let _ = writeln!(markup, "    end");
        return;
    }

    let ids: Vec<[String; 3]> = (0..story.scenarios().len())
        .map(|k| {
            [0, 1, 2].map(|offset| format!("{ordinal}_{}", node_letters(k * 3 + offset)))
        })
        .collect();

    for (scenario, [given, when, then]) in story.scenarios().iter().zip(&ids) {
        let _ = writeln!(
            markup,
            "        {given}[\"Given {}\"]",
            escape_label(scenario.precondition())
        );
        let _ = writeln!(
            markup,
            "        {when}{{\"When {}\"}}",
            escape_label(scenario.trigger())
        );
        let _ = writeln!(
            markup,
            "        {then}([\"Then {}\"])",
            escape_label(scenario.expected_outcome())
        );
    }

    for (k, [given, when, then]) in ids.iter().enumerate() {
        let _ = writeln!(markup, "        {given} --> {when}");
        let _ = writeln!(markup, "        {when} --> {then}");
        if let Some([next_given, _, _]) = ids.get(k + 1) {
            let _ = writeln!(markup, "        {then} --> {next_given}");
        }
    }
    let _ = writeln!(markup, "    end");
}
