//! Specgram - Mermaid diagrams synthesized from specification documents.
//!
//! Reads a Markdown specification, extracts its user stories and key
//! entities, renders them as Mermaid flowchart and entity-relationship
//! markup, validates the markup, and writes it back into marker-delimited
//! managed regions of the same document.

pub mod config;
pub mod document;
mod error;
pub mod report;
pub mod rewrite;
pub mod synth;
pub mod validate;

pub use specgram_core::{diagram, entity, region, story};

pub use error::SpecgramError;
pub use report::{DiagramSummary, RegionAction, RunReport, RunState, SkippedKind};

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, trace};
use tempfile::NamedTempFile;

use specgram_core::diagram::{DiagramKind, GeneratedDiagram};
use specgram_parser::{error::Diagnostic, locate_regions};

use config::AppConfig;
use document::DocumentModel;
use synth::{JourneySynthesizer, RelationshipSynthesizer, Synthesizer};
use validate::MarkupValidator;

/// Options for a single run.
///
/// # Examples
///
/// ```
/// use specgram::{RunOptions, diagram::DiagramKind};
///
/// let options = RunOptions::new("spec.md")
///     .with_kind(Some(DiagramKind::Journey))
///     .with_strict(true);
/// assert!(options.strict());
/// ```
#[derive(Debug, Clone)]
pub struct RunOptions {
    input: PathBuf,
    kind: Option<DiagramKind>,
    strict: bool,
    dry_run: bool,
    output: Option<PathBuf>,
}

impl RunOptions {
    /// Options that regenerate every diagram kind in `input`, in place.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            kind: None,
            strict: false,
            dry_run: false,
            output: None,
        }
    }

    /// Restrict the run to one diagram kind; `None` means all kinds.
    pub fn with_kind(mut self, kind: Option<DiagramKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Abort instead of committing when any diagram fails validation, and
    /// run the external validator.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Stop after validation without writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Write the rewritten document to `output` instead of the input.
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn kind(&self) -> Option<DiagramKind> {
        self.kind
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    fn includes(&self, kind: DiagramKind) -> bool {
        self.kind.is_none_or(|wanted| wanted == kind)
    }
}

/// Engine that keeps a document's diagrams in sync with its content.
///
/// A run moves through [`RunState`]s: the document is loaded, parsed,
/// diagrams are generated and validated, and the result is either committed
/// or the run is aborted with the document untouched.
///
/// # Examples
///
/// ```
/// use specgram::{DiagramEngine, RunOptions, RunState};
///
/// let source = concat!(
///     "## User Scenarios\n\n",
///     "### User Story 1 - Browse (Priority: P1)\n\n",
///     "1. **Given** a visitor, **When** they open the catalog, **Then** products are listed\n",
/// );
///
/// let engine = DiagramEngine::default();
/// let report = engine
///     .process(source, &RunOptions::new("spec.md"))
///     .expect("well-formed document");
///
/// assert_eq!(report.state(), RunState::Validated);
/// assert!(report.rewritten().unwrap().contains("flowchart TD"));
/// ```
pub struct DiagramEngine {
    config: AppConfig,
    synthesizers: Vec<Box<dyn Synthesizer>>,
    validator: MarkupValidator,
}

impl Default for DiagramEngine {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl DiagramEngine {
    /// Create an engine with the built-in synthesizers.
    pub fn new(config: AppConfig) -> Self {
        let synthesizers: Vec<Box<dyn Synthesizer>> = vec![
            Box::new(JourneySynthesizer::new(config.journey())),
            Box::new(RelationshipSynthesizer::new(config.relationship())),
        ];
        let validator = MarkupValidator::new(config.validation());
        Self {
            config,
            synthesizers,
            validator,
        }
    }

    /// Replace the synthesizer for the kind `synthesizer` produces.
    pub fn with_synthesizer(mut self, synthesizer: impl Synthesizer + 'static) -> Self {
        let kind = synthesizer.kind();
        self.synthesizers.retain(|existing| existing.kind() != kind);
        self.synthesizers.push(Box::new(synthesizer));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn synthesizer(&self, kind: DiagramKind) -> Option<&dyn Synthesizer> {
        self.synthesizers
            .iter()
            .find(|synthesizer| synthesizer.kind() == kind)
            .map(|synthesizer| synthesizer.as_ref())
    }

    /// Run every stage up to and including validation on `source`, and
    /// compute the rewritten text. Nothing is read or written.
    ///
    /// The returned report is in [`RunState::Validated`], or
    /// [`RunState::Aborted`] when strict validation failed.
    ///
    /// # Errors
    ///
    /// Returns [`SpecgramError::Config`] for an invalid configuration and
    /// [`SpecgramError::Parse`] when the region markers are ambiguous.
    pub fn process(&self, source: &str, options: &RunOptions) -> Result<RunReport, SpecgramError> {
        self.config.check().map_err(SpecgramError::Config)?;
        let mut report = RunReport::new(source.to_string());

        info!("Parsing document");
        let regions =
            locate_regions(source).map_err(|err| SpecgramError::new_parse_error(err, source))?;
        report.extend_diagnostics(regions.diagnostics().iter().cloned());
        let (model, diagnostics) = DocumentModel::extract(source);
        report.extend_diagnostics(diagnostics);
        debug!(
            regions = regions.regions().len(),
            stories = model.stories().len(),
            entities = model.entities().len();
            "Document parsed"
        );
        report.set_state(RunState::Parsed);

        let mut diagrams = Vec::new();
        for kind in DiagramKind::ALL.into_iter().filter(|kind| options.includes(*kind)) {
            let generated = self
                .synthesizer(kind)
                .and_then(|synthesizer| synthesizer.synthesize(&model));
            match generated {
                Some(diagram) => {
                    trace!(kind:% = kind, markup = diagram.markup_text(); "Diagram generated");
                    diagrams.push(diagram);
                }
                None => {
                    let reason = skip_reason(kind, &model);
                    debug!(kind:% = kind, reason = reason; "Diagram skipped");
                    report.push_skipped(SkippedKind::new(kind, reason));
                }
            }
        }
        info!(diagrams = diagrams.len(); "Diagrams generated");
        report.set_state(RunState::Generated);

        let diagrams: Vec<GeneratedDiagram> = diagrams
            .iter()
            .map(|diagram| diagram.with_validation(&self.validator.validate(diagram, options.strict())))
            .collect();

        let mut rejected = Vec::new();
        for diagram in &diagrams {
            let kind = diagram.kind();
            let verdict = diagram.validation();
            report.push_diagram(DiagramSummary::new(kind, diagram.node_count(), verdict.clone()));
            report.extend_diagnostics(
                verdict
                    .warnings()
                    .iter()
                    .map(|warning| Diagnostic::warning(format!("{kind} diagram: {warning}"))),
            );
            if verdict.passed() {
                continue;
            }
            if options.strict() {
                report.extend_diagnostics(
                    verdict
                        .errors()
                        .iter()
                        .map(|error| Diagnostic::error(format!("{kind} diagram: {error}"))),
                );
                rejected.push(kind.to_string());
            } else {
                report.extend_diagnostics(
                    verdict
                        .errors()
                        .iter()
                        .map(|error| Diagnostic::warning(format!("{kind} diagram: {error}"))),
                );
            }
        }
        report.set_state(RunState::Validated);

        if !rejected.is_empty() {
            report.abort(format!("{} failed validation", rejected.join(", ")));
            return Ok(report);
        }

        let rewrite = rewrite::rewrite(source, &regions, &diagrams, self.config.anchors());
        for (kind, action) in rewrite.actions() {
            report.set_action(*kind, *action);
        }
        report.set_rewritten(rewrite.into_text());
        Ok(report)
    }

    /// Regenerate the diagrams of the document at `options.input()`.
    ///
    /// Unless this is a dry run, the rewritten document is written through
    /// a temporary file in the target's directory and renamed over the
    /// target. An unchanged document is not written unless an explicit
    /// output path was given.
    ///
    /// # Errors
    ///
    /// Returns [`SpecgramError::Io`] if the document cannot be read or
    /// written, [`SpecgramError::StrictValidation`] when strict validation
    /// failed, and the errors of [`DiagramEngine::process`].
    pub fn run(&self, options: &RunOptions) -> Result<RunReport, SpecgramError> {
        let input = options.input();
        info!(path:% = input.display(); "Reading document");
        let source = fs::read_to_string(input)?;

        let mut report = self.process(&source, options)?;
        if report.state() == RunState::Aborted {
            return Err(SpecgramError::StrictValidation(Box::new(report)));
        }
        if options.dry_run() {
            info!("Dry run, document not written");
            return Ok(report);
        }

        let target = options.output().unwrap_or(input);
        let rewritten = report.rewritten().unwrap_or(report.source());
        if report.is_stale() || options.output().is_some() {
            write_atomic(target, rewritten)?;
            info!(path:% = target.display(); "Document written");
            report.set_written(target.to_path_buf());
        } else {
            info!("Document already up to date");
        }
        report.set_state(RunState::Committed);
        Ok(report)
    }
}

fn skip_reason(kind: DiagramKind, model: &DocumentModel) -> &'static str {
    match kind {
        DiagramKind::Journey => "no user stories found",
        DiagramKind::EntityRelationship if !model.entity_section_found() => {
            "no key entities section"
        }
        DiagramKind::EntityRelationship => "key entities section lists no entities",
    }
}

/// Write `text` to `path` by renaming a synced temporary file over it.
fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(text.as_bytes())?;
    file.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(file.path(), metadata.permissions())?;
    }
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
