//! Two-tier validation of generated markup.
//!
//! The first tier is [`structural::check`], which always runs. The second
//! tier hands the markup to a configured [`ExternalValidator`] and only runs
//! in strict mode, after the first tier passed.

pub mod external;
pub mod structural;

use log::{debug, warn};

use specgram_core::diagram::{GeneratedDiagram, ValidationVerdict};

use crate::config::ValidationConfig;

pub use external::{ExternalError, ExternalOutcome, ExternalValidator};

const EXTERNAL_PREFIX: &str = "external validation unavailable or failed";

/// Validates generated diagrams.
#[derive(Debug, Clone, Default)]
pub struct MarkupValidator {
    external: Option<ExternalValidator>,
}

impl MarkupValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            external: ExternalValidator::from_config(config),
        }
    }

    /// Validate `diagram` and return the verdict of the tiers that ran.
    ///
    /// When the external tier cannot run (no command configured, the command
    /// is missing, or it times out) the verdict carries a warning rather than
    /// an error. A command that runs and rejects the markup is an error.
    pub fn validate(&self, diagram: &GeneratedDiagram, strict: bool) -> ValidationVerdict {
        let kind = diagram.kind();
        let structural = structural::check(diagram.markup_text(), kind);
        debug!(
            kind:% = kind,
            errors = structural.errors().len();
            "Structural validation finished"
        );
        if !strict || !structural.passed() {
            return structural;
        }

        let Some(external) = &self.external else {
            return structural.combine(&ValidationVerdict::with_warnings(vec![format!(
                "{EXTERNAL_PREFIX}: no validator command configured"
            )]));
        };

        let external_verdict = match external.run(diagram.markup_text()) {
            Ok(ExternalOutcome::Accepted) => ValidationVerdict::pass(),
            Ok(ExternalOutcome::Rejected { status, stderr }) => {
                warn!(kind:% = kind, status = status.as_str(); "External validator rejected markup");
                let mut message = format!("{EXTERNAL_PREFIX}: `{}` exited with {status}", external.command());
                if !stderr.is_empty() {
                    message.push_str(": ");
                    message.push_str(&stderr);
                }
                ValidationVerdict::new(vec![message], Vec::new())
            }
            Err(err) => {
                warn!(kind:% = kind, err:% = err; "External validator did not run");
                ValidationVerdict::with_warnings(vec![format!("{EXTERNAL_PREFIX}: {err}")])
            }
        };
        structural.combine(&external_verdict)
    }
}
