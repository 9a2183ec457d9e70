//! Diagram synthesizers.
//!
//! A [`Synthesizer`] turns the extracted [`DocumentModel`] into Mermaid
//! markup for one [`DiagramKind`]. The engine holds one synthesizer per
//! kind; callers can swap either of them out.

pub mod journey;
pub mod label;
pub mod relationship;

use specgram_core::diagram::{DiagramKind, GeneratedDiagram};

use crate::document::DocumentModel;

pub use journey::JourneySynthesizer;
pub use relationship::RelationshipSynthesizer;

/// Renders one kind of diagram from a document model.
///
/// Implementations must be deterministic: the same model always yields the
/// same markup.
pub trait Synthesizer {
    /// The diagram kind this synthesizer produces.
    fn kind(&self) -> DiagramKind;

    /// Render the diagram, or `None` if the model has no input for it.
    ///
    /// The returned diagram carries the synthesizer's own verdict, e.g. a
    /// warning when the diagram is larger than recommended.
    fn synthesize(&self, model: &DocumentModel) -> Option<GeneratedDiagram>;
}
