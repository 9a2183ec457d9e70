//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A labeled span in the source document.
///
/// Primary labels mark where a problem is; secondary labels point at related
/// context such as an earlier definition.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_and_secondary_labels() {
        let primary = Label::primary(Span::new(10..20), "duplicate begin marker");
        let secondary = Label::secondary(Span::new(0..5), "first defined here");

        assert!(primary.is_primary());
        assert_eq!(primary.span().start(), 10);
        assert_eq!(primary.message(), "duplicate begin marker");
        assert!(!secondary.is_primary());
        assert_eq!(secondary.span().end(), 5);
    }
}
