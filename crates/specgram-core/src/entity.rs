//! Key entity records.
//!
//! Entities are re-derived from the document on every run. Relationships are
//! stored directionally (`source` → `target`) and are only ever created when
//! both ends name a known entity.

use std::fmt;

/// Multiplicity of a relationship between two entities, read from source to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// All cardinalities, in a fixed order.
    pub const ALL: [Cardinality; 4] = [
        Cardinality::OneToOne,
        Cardinality::OneToMany,
        Cardinality::ManyToOne,
        Cardinality::ManyToMany,
    ];

    /// Mermaid `erDiagram` token pair for this cardinality.
    pub fn mermaid_token(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "||--||",
            Cardinality::OneToMany => "||--o{",
            Cardinality::ManyToOne => "}o--||",
            Cardinality::ManyToMany => "}o--o{",
        }
    }

    /// Look up a cardinality by its Mermaid token pair.
    pub fn from_mermaid_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cardinality| cardinality.mermaid_token() == token)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        };
        write!(f, "{s}")
    }
}

/// A `name: type` attribute found in an entity description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    name: String,
    declared_type: String,
    is_primary_key: bool,
    is_foreign_key: bool,
}

impl AttributeRecord {
    /// Create a plain attribute with no key markers.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            is_primary_key: false,
            is_foreign_key: false,
        }
    }

    /// Mark this attribute as the entity's primary key.
    pub fn with_primary_key(mut self, is_primary_key: bool) -> Self {
        self.is_primary_key = is_primary_key;
        self
    }

    /// Mark this attribute as a foreign key.
    pub fn with_foreign_key(mut self, is_foreign_key: bool) -> Self {
        self.is_foreign_key = is_foreign_key;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.is_primary_key
    }

    pub fn is_foreign_key(&self) -> bool {
        self.is_foreign_key
    }
}

/// A directional relationship between two known entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipRecord {
    source_entity: String,
    target_entity: String,
    cardinality: Cardinality,
    label: String,
}

impl RelationshipRecord {
    pub fn new(
        source_entity: impl Into<String>,
        target_entity: impl Into<String>,
        cardinality: Cardinality,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source_entity: source_entity.into(),
            target_entity: target_entity.into(),
            cardinality,
            label: label.into(),
        }
    }

    pub fn source_entity(&self) -> &str {
        &self.source_entity
    }

    pub fn target_entity(&self) -> &str {
        &self.target_entity
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// An entity from the key entities section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    name: String,
    description: String,
    attributes: Vec<AttributeRecord>,
    relationships: Vec<RelationshipRecord>,
}

impl EntityRecord {
    /// Create an entity with no attributes or relationships.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Replace the attribute list.
    pub fn with_attributes(mut self, attributes: Vec<AttributeRecord>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Add a relationship unless an equivalent one is already present.
    ///
    /// Two relationships are equivalent when they share source, target, and
    /// cardinality; the first label wins. Returns `true` if it was added.
    pub fn add_relationship(&mut self, relationship: RelationshipRecord) -> bool {
        let exists = self.relationships.iter().any(|existing| {
            existing.source_entity == relationship.source_entity
                && existing.target_entity == relationship.target_entity
                && existing.cardinality == relationship.cardinality
        });
        if exists {
            return false;
        }
        self.relationships.push(relationship);
        true
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn attributes(&self) -> &[AttributeRecord] {
        &self.attributes
    }

    pub fn relationships(&self) -> &[RelationshipRecord] {
        &self.relationships
    }

    /// The primary key attribute, if any.
    pub fn primary_key(&self) -> Option<&AttributeRecord> {
        self.attributes.iter().find(|attr| attr.is_primary_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_tokens_round_trip() {
        for cardinality in Cardinality::ALL {
            assert_eq!(
                Cardinality::from_mermaid_token(cardinality.mermaid_token()),
                Some(cardinality)
            );
        }
        assert_eq!(Cardinality::from_mermaid_token("|o--o|"), None);
    }

    #[test]
    fn test_cardinality_display() {
        assert_eq!(Cardinality::OneToMany.to_string(), "one-to-many");
        assert_eq!(Cardinality::ManyToMany.to_string(), "many-to-many");
    }

    #[test]
    fn test_add_relationship_deduplicates() {
        let mut user = EntityRecord::new("User", "A registered account");

        assert!(user.add_relationship(RelationshipRecord::new(
            "User",
            "Order",
            Cardinality::OneToMany,
            "has many",
        )));
        assert!(!user.add_relationship(RelationshipRecord::new(
            "User",
            "Order",
            Cardinality::OneToMany,
            "owns many",
        )));
        assert!(user.add_relationship(RelationshipRecord::new(
            "User",
            "Profile",
            Cardinality::OneToOne,
            "has one",
        )));

        assert_eq!(user.relationships().len(), 2);
        assert_eq!(user.relationships()[0].label(), "has many");
    }

    #[test]
    fn test_primary_key_lookup() {
        let entity = EntityRecord::new("Order", "").with_attributes(vec![
            AttributeRecord::new("user_id", "uuid").with_foreign_key(true),
            AttributeRecord::new("id", "uuid").with_primary_key(true),
        ]);

        assert_eq!(entity.primary_key().map(AttributeRecord::name), Some("id"));
    }
}
