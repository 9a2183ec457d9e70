//! Error types for specgram operations.
//!
//! This module provides the main error type [`SpecgramError`]. Every variant
//! is fatal: the document is left untouched when a run returns one.

use std::io;

use thiserror::Error;

use specgram_parser::error::ParseError;

use crate::report::RunReport;

/// The main error type for specgram operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the region diagnostics together with the
/// source text they point into, for rich error reporting.
#[derive(Debug, Error)]
pub enum SpecgramError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Strict mode rejected at least one diagram; the report explains which.
    #[error("strict validation failed: {}", .0.abort_reason().unwrap_or("diagram rejected"))]
    StrictValidation(Box<RunReport>),
}

impl SpecgramError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
