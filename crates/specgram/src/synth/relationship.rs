//! Entity-relationship diagram synthesis.

use std::{collections::HashMap, fmt::Write as _};

use log::{debug, info};

use specgram_core::{
    diagram::{DiagramKind, GeneratedDiagram, ValidationVerdict},
    entity::{AttributeRecord, EntityRecord},
};

use crate::{
    config::RelationshipConfig,
    document::DocumentModel,
    synth::{
        Synthesizer,
        label::{entity_ids, escape_label},
    },
};

/// Renders key entities as a Mermaid `erDiagram`.
#[derive(Debug, Clone)]
pub struct RelationshipSynthesizer {
    soft_entity_limit: usize,
    hard_entity_limit: usize,
}

impl RelationshipSynthesizer {
    pub fn new(config: &RelationshipConfig) -> Self {
        Self {
            soft_entity_limit: config.soft_entity_limit(),
            hard_entity_limit: config.hard_entity_limit(),
        }
    }

    /// Render `entities` as an entity-relationship diagram.
    ///
    /// Entity blocks come first in document order, then every relationship
    /// line grouped by source entity.
    pub fn render(&self, entities: &[EntityRecord]) -> GeneratedDiagram {
        let ids = entity_ids(entities.iter().map(|e| e.name()));
        let id_of: HashMap<&str, &str> = entities
            .iter()
            .map(|e| e.name())
            .zip(ids.iter().map(String::as_str))
            .collect();

        let mut markup = String::from("erDiagram\n");
        for (entity, id) in entities.iter().zip(&ids) {
            write_entity(&mut markup, id, entity.attributes());
        }

        let mut relationship_count = 0;
        for entity in entities {
            for relationship in entity.relationships() {
                let (Some(source), Some(target)) = (
                    id_of.get(relationship.source_entity()),
                    id_of.get(relationship.target_entity()),
                ) else {
                    continue;
                };
                let _ = writeln!(
                    markup,
                    "    {source} {} {target} : \"{}\"",
                    relationship.cardinality().mermaid_token(),
                    escape_label(relationship.label())
                );
                relationship_count += 1;
            }
        }

        let node_count = entities.len();
        if node_count > self.soft_entity_limit {
            info!(
                entities = node_count,
                soft_limit = self.soft_entity_limit;
                "Entity-relationship diagram above soft limit"
            );
        }
        let mut warnings = Vec::new();
        if node_count > self.hard_entity_limit {
            warnings.push(format!(
                "entity-relationship diagram has {node_count} entities (limit {}); consider splitting the data model",
                self.hard_entity_limit
            ));
        }

        debug!(
            entities = node_count,
            relationships = relationship_count;
            "Entity-relationship diagram rendered"
        );
        GeneratedDiagram::new(
            DiagramKind::EntityRelationship,
            markup,
            node_count,
            ValidationVerdict::with_warnings(warnings),
        )
    }
}

impl Synthesizer for RelationshipSynthesizer {
    fn kind(&self) -> DiagramKind {
        DiagramKind::EntityRelationship
    }

    fn synthesize(&self, model: &DocumentModel) -> Option<GeneratedDiagram> {
        if !model.entity_section_found() || model.entities().is_empty() {
            return None;
        }
        Some(self.render(model.entities()))
    }
}

fn write_entity(markup: &mut String, id: &str, attributes: &[AttributeRecord]) {
    if attributes.is_empty() {
        let _ = writeln!(markup, "    {id}");
        return;
    }

    let _ = writeln!(markup, "    {id} {{");
    for attribute in attributes {
        let keys = match (attribute.is_primary_key(), attribute.is_foreign_key()) {
            (true, true) => " PK, FK",
            (true, false) => " PK",
            (false, true) => " FK",
            (false, false) => "",
        };
        let _ = writeln!(
            markup,
            "        {} {}{keys}",
            mermaid_word(attribute.declared_type(), true),
            mermaid_word(attribute.name(), false)
        );
    }
    let _ = writeln!(markup, "    }}");
}

/// Replace characters Mermaid does not accept in attribute types and names.
fn mermaid_word(text: &str, allow_brackets: bool) -> String {
    let mut word: String = text
        .chars()
        .map(|c| {
            let allowed = c.is_ascii_alphanumeric()
                || c == '_'
                || c == '-'
                || (allow_brackets && (c == '[' || c == ']'));
            if allowed { c } else { '_' }
        })
        .collect();
    if !word.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        word.insert(0, '_');
    }
    word
}
