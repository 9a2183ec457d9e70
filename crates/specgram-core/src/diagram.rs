//! Generated diagrams and validation verdicts.
//!
//! A [`GeneratedDiagram`] lives for a single run: it is produced by a
//! synthesizer, checked by the validator, and written into its managed region.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// The kinds of diagram the engine knows how to generate.
///
/// The kebab-case names double as managed region names in the document
/// (`section="journey"`) and as configuration strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramKind {
    /// Flowchart of user stories and their scenarios.
    Journey,
    /// Entity-relationship diagram of the key entities.
    EntityRelationship,
}

impl DiagramKind {
    /// All kinds, in generation order.
    pub const ALL: [DiagramKind; 2] = [DiagramKind::Journey, DiagramKind::EntityRelationship];

    /// The region name used for this kind.
    pub fn region_name(&self) -> &'static str {
        (*self).into()
    }
}

impl FromStr for DiagramKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "journey" => Ok(Self::Journey),
            "entity-relationship" | "er" => Ok(Self::EntityRelationship),
            _ => Err("Unsupported diagram kind"),
        }
    }
}

impl From<DiagramKind> for &'static str {
    fn from(val: DiagramKind) -> Self {
        match val {
            DiagramKind::Journey => "journey",
            DiagramKind::EntityRelationship => "entity-relationship",
        }
    }
}

impl Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// Outcome of validating a piece of markup.
///
/// A verdict is immutable once built; [`ValidationVerdict::combine`] returns
/// a new verdict holding the messages of both inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationVerdict {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationVerdict {
    /// Create a verdict from error and warning messages.
    ///
    /// The verdict passes when there are no errors.
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self { errors, warnings }
    }

    /// A passing verdict with no messages.
    pub fn pass() -> Self {
        Self::default()
    }

    /// A passing verdict carrying only warnings.
    pub fn with_warnings(warnings: Vec<String>) -> Self {
        Self::new(Vec::new(), warnings)
    }

    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Combine two verdicts, keeping `self`'s messages first.
    pub fn combine(&self, other: &ValidationVerdict) -> ValidationVerdict {
        let errors = self.errors.iter().chain(&other.errors).cloned().collect();
        let warnings = self
            .warnings
            .iter()
            .chain(&other.warnings)
            .cloned()
            .collect();
        Self::new(errors, warnings)
    }
}

/// Markup produced by a synthesizer, along with its node count and verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDiagram {
    kind: DiagramKind,
    markup_text: String,
    node_count: usize,
    validation: ValidationVerdict,
}

impl GeneratedDiagram {
    pub fn new(
        kind: DiagramKind,
        markup_text: impl Into<String>,
        node_count: usize,
        validation: ValidationVerdict,
    ) -> Self {
        Self {
            kind,
            markup_text: markup_text.into(),
            node_count,
            validation,
        }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn markup_text(&self) -> &str {
        &self.markup_text
    }

    /// Number of nodes (journey) or entities (entity-relationship) in the markup.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn validation(&self) -> &ValidationVerdict {
        &self.validation
    }

    /// Return a copy of this diagram whose verdict also includes `verdict`.
    pub fn with_validation(&self, verdict: &ValidationVerdict) -> GeneratedDiagram {
        Self {
            validation: self.validation.combine(verdict),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagram_kind_from_str() {
        assert_eq!("journey".parse::<DiagramKind>(), Ok(DiagramKind::Journey));
        assert_eq!(
            "entity-relationship".parse::<DiagramKind>(),
            Ok(DiagramKind::EntityRelationship)
        );
        assert_eq!(
            "er".parse::<DiagramKind>(),
            Ok(DiagramKind::EntityRelationship)
        );
        assert!("sequence".parse::<DiagramKind>().is_err());
    }

    #[test]
    fn test_region_names() {
        assert_eq!(DiagramKind::Journey.region_name(), "journey");
        assert_eq!(
            DiagramKind::EntityRelationship.region_name(),
            "entity-relationship"
        );
    }

    #[test]
    fn test_verdict_passes_without_errors() {
        assert!(ValidationVerdict::pass().passed());
        assert!(ValidationVerdict::with_warnings(vec!["large".into()]).passed());
        assert!(!ValidationVerdict::new(vec!["bad".into()], vec![]).passed());
    }

    #[test]
    fn test_verdict_combine_keeps_order() {
        let first = ValidationVerdict::new(vec!["e1".into()], vec!["w1".into()]);
        let second = ValidationVerdict::new(vec!["e2".into()], vec!["w2".into()]);

        let combined = first.combine(&second);

        assert_eq!(combined.errors(), ["e1", "e2"]);
        assert_eq!(combined.warnings(), ["w1", "w2"]);
        assert!(!combined.passed());
        // Inputs are untouched
        assert_eq!(first.errors(), ["e1"]);
    }

    #[test]
    fn test_with_validation_merges_verdicts() {
        let diagram = GeneratedDiagram::new(
            DiagramKind::Journey,
            "flowchart TD\n",
            0,
            ValidationVerdict::with_warnings(vec!["split suggested".into()]),
        );

        let checked = diagram.with_validation(&ValidationVerdict::new(vec!["bad".into()], vec![]));

        assert!(!checked.validation().passed());
        assert_eq!(checked.validation().warnings(), ["split suggested"]);
        assert!(diagram.validation().passed());
    }
}
