//! Run reports.
//!
//! A [`RunReport`] records how far a run got, what happened to each diagram,
//! and every non-fatal condition met along the way.

use std::{fmt, path::PathBuf};

use specgram_core::diagram::{DiagramKind, ValidationVerdict};
use specgram_parser::error::{Diagnostic, Severity};

/// Stages of a run, in order. A run ends in `Committed` or `Aborted`; a dry
/// run stops at `Validated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Loaded,
    Parsed,
    Generated,
    Validated,
    Committed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Loaded => "loaded",
            RunState::Parsed => "parsed",
            RunState::Generated => "generated",
            RunState::Validated => "validated",
            RunState::Committed => "committed",
            RunState::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// What the rewrite did to a diagram's managed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionAction {
    /// A new region was inserted at its anchor.
    Inserted,
    /// The region's content was replaced.
    Replaced,
    /// The region already held the generated markup.
    Unchanged,
}

impl fmt::Display for RegionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegionAction::Inserted => "inserted",
            RegionAction::Replaced => "replaced",
            RegionAction::Unchanged => "unchanged",
        };
        write!(f, "{s}")
    }
}

/// Outcome for one generated diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSummary {
    kind: DiagramKind,
    node_count: usize,
    action: Option<RegionAction>,
    verdict: ValidationVerdict,
}

impl DiagramSummary {
    pub fn new(kind: DiagramKind, node_count: usize, verdict: ValidationVerdict) -> Self {
        Self {
            kind,
            node_count,
            action: None,
            verdict,
        }
    }

    pub fn with_action(mut self, action: RegionAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// `None` if the run stopped before the rewrite.
    pub fn action(&self) -> Option<RegionAction> {
        self.action
    }

    /// Combined synthesizer and validator verdict.
    pub fn verdict(&self) -> &ValidationVerdict {
        &self.verdict
    }
}

/// A requested kind that produced no diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedKind {
    kind: DiagramKind,
    reason: String,
}

impl SkippedKind {
    pub fn new(kind: DiagramKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Result of a run that did not fail outright.
#[derive(Debug, Clone)]
pub struct RunReport {
    state: RunState,
    diagrams: Vec<DiagramSummary>,
    skipped: Vec<SkippedKind>,
    diagnostics: Vec<Diagnostic>,
    changed: bool,
    written: Option<PathBuf>,
    abort_reason: Option<String>,
    source: String,
    rewritten: Option<String>,
}

impl RunReport {
    pub(crate) fn new(source: String) -> Self {
        Self {
            state: RunState::Loaded,
            diagrams: Vec::new(),
            skipped: Vec::new(),
            diagnostics: Vec::new(),
            changed: false,
            written: None,
            abort_reason: None,
            source,
            rewritten: None,
        }
    }

    pub(crate) fn set_state(&mut self, state: RunState) {
        log::debug!(from:% = self.state, to:% = state; "Run state transition");
        self.state = state;
    }

    pub(crate) fn push_diagram(&mut self, summary: DiagramSummary) {
        self.diagrams.push(summary);
    }

    pub(crate) fn set_action(&mut self, kind: DiagramKind, action: RegionAction) {
        if let Some(summary) = self.diagrams.iter_mut().find(|d| d.kind == kind) {
            summary.action = Some(action);
        }
    }

    pub(crate) fn push_skipped(&mut self, skipped: SkippedKind) {
        self.skipped.push(skipped);
    }

    pub(crate) fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub(crate) fn set_rewritten(&mut self, rewritten: String) {
        self.changed = rewritten != self.source;
        self.rewritten = Some(rewritten);
    }

    pub(crate) fn set_written(&mut self, path: PathBuf) {
        self.written = Some(path);
    }

    pub(crate) fn abort(&mut self, reason: impl Into<String>) {
        self.abort_reason = Some(reason.into());
        self.set_state(RunState::Aborted);
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn diagrams(&self) -> &[DiagramSummary] {
        &self.diagrams
    }

    pub fn diagram(&self, kind: DiagramKind) -> Option<&DiagramSummary> {
        self.diagrams.iter().find(|d| d.kind() == kind)
    }

    pub fn skipped(&self) -> &[SkippedKind] {
        &self.skipped
    }

    /// Diagnostics collected during the run: extraction and region
    /// warnings, validation messages, and the errors that aborted a strict
    /// run.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity() == Severity::Warning)
    }

    /// Returns `true` if the rewritten text differs from the source, i.e.
    /// some managed region is out of date. Always `false` before the rewrite
    /// has been computed.
    pub fn is_stale(&self) -> bool {
        self.changed
    }

    /// Where the document was written, if it was.
    pub fn written(&self) -> Option<&PathBuf> {
        self.written.as_ref()
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.abort_reason.as_deref()
    }

    /// The document as it was read.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The rewritten document, if the run got that far.
    pub fn rewritten(&self) -> Option<&str> {
        self.rewritten.as_deref()
    }

    /// Process exit status for this report: `1` when aborted, `0` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.state {
            RunState::Aborted => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run {}", self.state)?;
        for diagram in &self.diagrams {
            write!(f, "  {}: {} nodes", diagram.kind, diagram.node_count)?;
            if let Some(action) = diagram.action {
                write!(f, ", region {action}")?;
            }
            let verdict = &diagram.verdict;
            if !verdict.errors().is_empty() {
                write!(f, ", {} error(s)", verdict.errors().len())?;
            }
            if !verdict.warnings().is_empty() {
                write!(f, ", {} warning(s)", verdict.warnings().len())?;
            }
            writeln!(f)?;
        }
        for skipped in &self.skipped {
            writeln!(f, "  {}: skipped ({})", skipped.kind, skipped.reason)?;
        }
        if let Some(reason) = &self.abort_reason {
            writeln!(f, "  aborted: {reason}")?;
        }
        match &self.written {
            Some(path) => writeln!(f, "  wrote {}", path.display())?,
            None if self.state == RunState::Committed => writeln!(f, "  document unchanged")?,
            None => {}
        }
        let warnings = self
            .diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count();
        if warnings > 0 {
            writeln!(f, "  {warnings} warning(s)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        let mut report = RunReport::new("doc".to_string());
        report.push_diagram(
            DiagramSummary::new(
                DiagramKind::Journey,
                6,
                ValidationVerdict::with_warnings(vec!["big".to_string()]),
            )
            .with_action(RegionAction::Inserted),
        );
        report.push_skipped(SkippedKind::new(
            DiagramKind::EntityRelationship,
            "no key entities section",
        ));
        report.set_rewritten("doc".to_string());
        report.set_state(RunState::Committed);

        let summary = report.to_string();
        assert_eq!(
            summary,
            concat!(
                "run committed\n",
                "  journey: 6 nodes, region inserted, 1 warning(s)\n",
                "  entity-relationship: skipped (no key entities section)\n",
                "  document unchanged\n",
            )
        );
        assert!(!report.is_stale());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_aborted_exit_code() {
        let mut report = RunReport::new(String::new());
        report.abort("strict validation failed");

        assert_eq!(report.state(), RunState::Aborted);
        assert_eq!(report.exit_code(), 1);
        assert!(report.to_string().contains("aborted: strict validation failed"));
    }
}
