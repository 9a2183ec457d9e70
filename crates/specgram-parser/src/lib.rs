//! # Specgram Parser
//!
//! Recognition layer for specgram. This crate reads a Markdown specification
//! document and extracts everything the diagram synthesizers need:
//!
//! 1. **Regions** - marker-delimited managed regions ([`locate_regions`])
//! 2. **Stories** - user stories and acceptance scenarios ([`extract_stories`])
//! 3. **Entities** - key entities, attributes, relationships ([`extract_entities`])
//!
//! Region location fails on ambiguous markers. The extractors never fail:
//! anything they cannot read is skipped and reported as a warning
//! [`Diagnostic`](error::Diagnostic).
//!
//! ## Usage
//!
//! ```
//! # use specgram_parser::{extract_stories, locate_regions, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = concat!(
//!         "### User Story 1 - Browse (Priority: P1)\n\n",
//!         "1. **Given** a visitor, **When** they open the catalog, **Then** products are listed\n",
//!     );
//!
//!     let regions = locate_regions(source)?;
//!     assert!(regions.regions().is_empty());
//!
//!     let stories = extract_stories(source);
//!     assert_eq!(stories.records().len(), 1);
//!     Ok(())
//! }
//! ```

pub mod entity;
pub mod error;
mod lines;
pub mod outline;
pub mod region;
mod span;
pub mod story;
mod vocabulary;

pub use entity::{EntityExtraction, extract_entities};
pub use outline::{SectionHeading, section_headings};
pub use region::{RegionMap, find_region, locate_regions};
pub use span::Span;
pub use story::extract_stories;

use error::Diagnostic;

/// Records recovered from a document together with the warnings raised
/// while reading it.
#[derive(Debug, Clone)]
pub struct Extraction<T> {
    records: Vec<T>,
    diagnostics: Vec<Diagnostic>,
}

impl<T> Extraction<T> {
    pub fn new(records: Vec<T>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            records,
            diagnostics,
        }
    }

    /// Records in document order.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<Diagnostic>) {
        (self.records, self.diagnostics)
    }
}

impl<T> Default for Extraction<T> {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}
