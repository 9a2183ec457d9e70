//! Fixed vocabularies used by the entity extractor.

use specgram_core::entity::Cardinality;

/// A relationship phrase and the cardinality it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Phrase {
    pub text: &'static str,
    pub cardinality: Cardinality,
}

impl Phrase {
    const fn new(text: &'static str, cardinality: Cardinality) -> Self {
        Self { text, cardinality }
    }

    /// Label written on the relationship line, e.g. `one-to-many` becomes
    /// `one to many`.
    pub fn label(&self) -> String {
        self.text.replace('-', " ")
    }
}

/// Relationship phrases, longest first so that `has one or more` wins over
/// `has one`. Matching is case-insensitive.
pub(crate) const RELATIONSHIP_PHRASES: &[Phrase] = &[
    Phrase::new("has and belongs to many", Cardinality::ManyToMany),
    Phrase::new("contains multiple", Cardinality::OneToMany),
    Phrase::new("has zero or more", Cardinality::OneToMany),
    Phrase::new("has one or more", Cardinality::OneToMany),
    Phrase::new("has exactly one", Cardinality::OneToOne),
    Phrase::new("belongs to many", Cardinality::ManyToMany),
    Phrase::new("contains many", Cardinality::OneToMany),
    Phrase::new("has a single", Cardinality::OneToOne),
    Phrase::new("has multiple", Cardinality::OneToMany),
    Phrase::new("many-to-many", Cardinality::ManyToMany),
    Phrase::new("many to many", Cardinality::ManyToMany),
    Phrase::new("is owned by", Cardinality::ManyToOne),
    Phrase::new("one-to-many", Cardinality::OneToMany),
    Phrase::new("one to many", Cardinality::OneToMany),
    Phrase::new("many-to-one", Cardinality::ManyToOne),
    Phrase::new("many to one", Cardinality::ManyToOne),
    Phrase::new("belongs to", Cardinality::ManyToOne),
    Phrase::new("one-to-one", Cardinality::OneToOne),
    Phrase::new("one to one", Cardinality::OneToOne),
    Phrase::new("belong to", Cardinality::ManyToOne),
    Phrase::new("owns many", Cardinality::OneToMany),
    Phrase::new("have many", Cardinality::OneToMany),
    Phrase::new("has many", Cardinality::OneToMany),
    Phrase::new("has one", Cardinality::OneToOne),
];

/// Words allowed between a relationship phrase and the entity name.
pub(crate) const FILLER_WORDS: &[&str] = &[
    "a",
    "an",
    "the",
    "one",
    "many",
    "multiple",
    "several",
    "single",
    "exactly",
    "each",
    "other",
    "with",
    "to",
    "of",
    "relationship",
];

/// At most this many filler words are skipped before the entity name.
pub(crate) const MAX_FILLER_WORDS: usize = 3;

/// Attribute types recognised without backticks.
pub(crate) const ATTRIBUTE_TYPES: &[&str] = &[
    "string",
    "text",
    "int",
    "integer",
    "bigint",
    "float",
    "double",
    "decimal",
    "number",
    "bool",
    "boolean",
    "date",
    "datetime",
    "timestamp",
    "time",
    "uuid",
    "json",
    "enum",
    "bytes",
    "binary",
    "money",
    "email",
    "url",
];

pub(crate) fn is_filler_word(word: &str) -> bool {
    FILLER_WORDS.iter().any(|filler| filler.eq_ignore_ascii_case(word))
}

/// Returns `true` for a known attribute type; a trailing `[]` is ignored.
pub(crate) fn is_attribute_type(declared: &str) -> bool {
    let base = declared.strip_suffix("[]").unwrap_or(declared);
    ATTRIBUTE_TYPES.iter().any(|ty| ty.eq_ignore_ascii_case(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrases_are_longest_first() {
        for pair in RELATIONSHIP_PHRASES.windows(2) {
            assert!(
                pair[0].text.len() >= pair[1].text.len(),
                "`{}` must come before `{}`",
                pair[1].text,
                pair[0].text
            );
        }
    }

    #[test]
    fn test_phrases_are_lowercase_and_unique() {
        for (i, phrase) in RELATIONSHIP_PHRASES.iter().enumerate() {
            assert_eq!(phrase.text, phrase.text.to_lowercase());
            assert!(
                RELATIONSHIP_PHRASES[i + 1..]
                    .iter()
                    .all(|other| other.text != phrase.text)
            );
        }
    }

    #[test]
    fn test_every_cardinality_has_a_phrase() {
        for cardinality in Cardinality::ALL {
            assert!(
                RELATIONSHIP_PHRASES
                    .iter()
                    .any(|phrase| phrase.cardinality == cardinality)
            );
        }
    }

    #[test]
    fn test_label() {
        let phrase = Phrase::new("one-to-many", Cardinality::OneToMany);
        assert_eq!(phrase.label(), "one to many");
    }

    #[test]
    fn test_attribute_types() {
        assert!(is_attribute_type("uuid"));
        assert!(is_attribute_type("String"));
        assert!(is_attribute_type("string[]"));
        assert!(!is_attribute_type("widget"));
        assert!(is_filler_word("The"));
        assert!(!is_filler_word("order"));
    }
}
