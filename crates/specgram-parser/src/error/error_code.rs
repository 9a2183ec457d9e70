//! Error codes for the specgram diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Region marker errors
//! - `E1xx` - Story extraction diagnostics
//! - `E2xx` - Entity extraction diagnostics

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Region Errors (E0xx)
    // =========================================================================
    /// Duplicate region.
    ///
    /// Two begin markers carry the same section name, so the target of a
    /// rewrite is ambiguous.
    E001,

    /// Nested region.
    ///
    /// A begin marker appeared while another region was still open.
    E002,

    /// Unmatched end marker.
    ///
    /// An end marker names a section that is not currently open.
    E003,

    /// Unterminated region.
    ///
    /// A begin marker has no matching end marker; the region runs to the end
    /// of the document.
    E004,

    // =========================================================================
    // Story Diagnostics (E1xx)
    // =========================================================================
    /// Malformed story header.
    ///
    /// A heading starts like a user story but lacks a number, title, or
    /// priority tag.
    E100,

    /// Malformed acceptance scenario.
    ///
    /// A numbered line mentions Given/When/Then but does not follow the
    /// three-clause shape.
    E101,

    /// Story without scenarios.
    ///
    /// The story is kept but rendered as a single title node.
    E102,

    /// Out-of-sequence story number.
    ///
    /// Story numbers are kept as written, even when not increasing.
    E103,

    // =========================================================================
    // Entity Diagnostics (E2xx)
    // =========================================================================
    /// Entity bullet without a name.
    ///
    /// A top-level bullet in the key entities section does not start with an
    /// emphasized entity name.
    E200,

    /// Duplicate entity definition.
    ///
    /// An entity with this name has already been defined.
    E201,

    /// Multiple primary keys.
    ///
    /// Only the first `id` attribute of an entity is treated as its primary key.
    E202,

    /// Unresolved relationship target.
    ///
    /// A relationship phrase does not name a known entity and was discarded.
    E203,

    /// Duplicate attribute.
    ///
    /// An attribute with this name was already declared on the entity.
    E204,

    /// Conflicting cardinality.
    ///
    /// The same pair of entities is described with different cardinalities;
    /// all of those relationships were discarded.
    E205,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Region errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            // Story diagnostics
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            // Entity diagnostics
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
