//! Error and diagnostic system for the specgram parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors and warnings
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, multiple source
//! locations, and help text. Fatal diagnostics are wrapped in [`ParseError`];
//! warnings travel alongside extracted records so a run can report every
//! problem in one pass.
//!
//! # Example
//!
//! ```
//! # use specgram_parser::error::{Diagnostic, ErrorCode};
//! # use specgram_parser::Span;
//!
//! let span = Span::new(100..120);
//! let original_span = Span::new(50..70);
//!
//! let diag = Diagnostic::error("region `journey` is defined multiple times")
//!     .with_code(ErrorCode::E001)
//!     .with_label(span, "duplicate begin marker")
//!     .with_secondary_label(original_span, "first defined here")
//!     .with_help("remove one of the regions");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
