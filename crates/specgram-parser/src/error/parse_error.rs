//! The ParseError type for fatal parsing diagnostics.
//!
//! [`ParseError`] wraps one or more [`Diagnostic`]s that stop a run, such as
//! ambiguous region markers. It may also carry the warnings collected before
//! the failure so nothing is lost from the final report.

use std::fmt;

use crate::error::Diagnostic;

/// Error type for fatal parsing problems.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Iterate over the error-severity diagnostics only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity().is_error())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut errors = self.errors();
        if let Some(first) = errors.next() {
            write!(f, "{}", first)?;
            let rest = errors.count();
            if rest > 0 {
                write!(f, " (+{} more)", rest)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_error_from_diagnostic() {
        let diag = Diagnostic::error("duplicate region").with_code(ErrorCode::E001);
        let err: ParseError = diag.into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].message(), "duplicate region");
    }

    #[test]
    fn test_parse_error_display_single() {
        let err: ParseError = Diagnostic::error("nested region").into();

        assert_eq!(err.to_string(), "error: nested region");
    }

    #[test]
    fn test_parse_error_display_skips_warnings() {
        let diags = vec![
            Diagnostic::warning("stray end marker"),
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
        ];
        let err: ParseError = diags.into();

        assert_eq!(err.diagnostics().len(), 3);
        assert_eq!(err.errors().count(), 2);
        assert_eq!(err.to_string(), "error: first error (+1 more)");
    }
}
