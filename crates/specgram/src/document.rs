//! The typed model extracted from a specification document.

use specgram_core::{entity::EntityRecord, story::StoryRecord};
use specgram_parser::{error::Diagnostic, extract_entities, extract_stories};

/// Everything the synthesizers read, extracted fresh on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentModel {
    stories: Vec<StoryRecord>,
    entities: Vec<EntityRecord>,
    entity_section_found: bool,
}

impl DocumentModel {
    pub fn new(
        stories: Vec<StoryRecord>,
        entities: Vec<EntityRecord>,
        entity_section_found: bool,
    ) -> Self {
        Self {
            stories,
            entities,
            entity_section_found,
        }
    }

    /// Run both extractors over `text`.
    ///
    /// Returns the model and every warning the extractors raised, stories
    /// first.
    pub fn extract(text: &str) -> (Self, Vec<Diagnostic>) {
        let (stories, mut diagnostics) = extract_stories(text).into_parts();
        let entities = extract_entities(text);
        let entity_section_found = entities.section_found();
        let (entities, entity_diagnostics) = entities.into_parts();
        diagnostics.extend(entity_diagnostics);

        (
            Self::new(stories, entities, entity_section_found),
            diagnostics,
        )
    }

    pub fn stories(&self) -> &[StoryRecord] {
        &self.stories
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// Returns `true` if the document has a "Key Entities" section, even an
    /// empty one.
    pub fn entity_section_found(&self) -> bool {
        self.entity_section_found
    }
}
