//! Entity extractor.
//!
//! Reads the bullets of the "Key Entities" section:
//!
//! ```text
//! ## Key Entities
//!
//! - **User**: A registered account with `id: uuid` and `email: string`.
//!   Has many Order records.
//! - **Order**: A purchase with `id: uuid`, `user_id: uuid`. Belongs to User.
//! ```
//!
//! Attributes are `name: type` tokens. Relationships are inferred only from
//! a fixed phrase vocabulary followed by the exact name of another entity;
//! everything else is discarded rather than guessed.

use indexmap::IndexMap;
use winnow::{
    Parser as _,
    ascii::{Caseless, space0, space1},
    combinator::{alt, delimited, eof, opt, preceded},
    error::ModalResult,
    token::{literal, one_of, rest, take_till, take_until, take_while},
};

use specgram_core::entity::{AttributeRecord, EntityRecord, RelationshipRecord};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    lines::{self, Line},
    span::Span,
    vocabulary::{self, MAX_FILLER_WORDS, Phrase, RELATIONSHIP_PHRASES},
};

type IResult<O> = ModalResult<O>;

/// Result of entity extraction.
#[derive(Debug, Clone, Default)]
pub struct EntityExtraction {
    records: Vec<EntityRecord>,
    diagnostics: Vec<Diagnostic>,
    section_found: bool,
}

impl EntityExtraction {
    /// Entities in document order.
    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if the document has a "Key Entities" section at all.
    pub fn section_found(&self) -> bool {
        self.section_found
    }

    pub fn into_parts(self) -> (Vec<EntityRecord>, Vec<Diagnostic>) {
        (self.records, self.diagnostics)
    }
}

// =============================================================================
// Section and bullets
// =============================================================================

/// Lines of the first "Key Entities" section, heading excluded.
fn key_entities_section<'a>(scanned: &[Line<'a>]) -> Option<Vec<Line<'a>>> {
    let (index, level) = scanned.iter().enumerate().find_map(|(i, line)| {
        lines::heading(line)
            .filter(|h| h.text.to_lowercase().contains("key entities"))
            .map(|h| (i, h.level))
    })?;

    let section = scanned[index + 1..]
        .iter()
        .take_while(|line| lines::heading(line).is_none_or(|h| h.level > level))
        .copied()
        .collect();
    Some(section)
}

fn is_top_level_bullet(line: &Line<'_>) -> bool {
    let mut chars = line.text.chars();
    matches!(chars.next(), Some('-' | '*' | '+')) && matches!(chars.next(), Some(' ' | '\t'))
}

fn emphasized_name<'a>(input: &mut &'a str) -> IResult<&'a str> {
    alt((
        delimited("**", take_until(1.., "**"), "**"),
        delimited("__", take_until(1.., "__"), "__"),
        delimited('*', take_till(1.., '*'), '*'),
        delimited('_', take_till(1.., '_'), '_'),
    ))
    .parse_next(input)
}

/// `- **Name**: description`; returns the raw name and description.
fn entity_bullet<'a>(input: &mut &'a str) -> IResult<(&'a str, &'a str)> {
    (one_of(['-', '*', '+']), space1).parse_next(input)?;
    let name = emphasized_name.parse_next(input)?;
    (space0, opt(alt((":", "-", "–", "—"))), space0).parse_next(input)?;
    let description = rest.parse_next(input)?;
    Ok((name, description))
}

fn clean_name(raw: &str) -> &str {
    raw.trim().trim_end_matches(':').trim_end()
}

/// One entity bullet together with its indented continuation lines.
#[derive(Debug)]
struct EntityBlock {
    name: String,
    description: String,
    body: String,
    span: Span,
}

impl EntityBlock {
    fn new(name: &str, description: &str, span: Span) -> Self {
        Self {
            name: name.to_string(),
            description: description.trim().to_string(),
            body: description.to_string(),
            span,
        }
    }

    fn push_line(&mut self, text: &str) {
        self.body.push('\n');
        self.body.push_str(text.trim());
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Explicit key annotation after an attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyMarker {
    Primary,
    Foreign,
}

/// A `name: type` token, optionally followed by `PK` / `FK`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeToken<'a> {
    name: &'a str,
    declared_type: &'a str,
    marker: Option<KeyMarker>,
}

fn attribute_token<'a>(input: &mut &'a str) -> IResult<AttributeToken<'a>> {
    let name = take_while(1.., |c: char| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
    })
    .verify(|name: &str| !name.starts_with(|c: char| c.is_ascii_digit()))
    .parse_next(input)?;
    (':', space0).parse_next(input)?;
    let declared_type = (
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_')
            .verify(|ty: &str| ty.starts_with(|c: char| c.is_ascii_alphabetic())),
        opt("[]"),
    )
        .take()
        .parse_next(input)?;
    let marker = opt(preceded(
        space1,
        alt((
            "(PK)".value(KeyMarker::Primary),
            "PK".value(KeyMarker::Primary),
            "(FK)".value(KeyMarker::Foreign),
            "FK".value(KeyMarker::Foreign),
        )),
    ))
    .parse_next(input)?;

    Ok(AttributeToken {
        name,
        declared_type,
        marker,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Returns `true` if `pos` starts a word in `text`.
fn is_word_start(text: &str, pos: usize) -> bool {
    text[..pos].chars().next_back().is_none_or(|c| !is_word_char(c))
}

/// Returns `true` if `rest` does not continue the previous word.
fn at_word_end(rest: &str) -> bool {
    rest.chars().next().is_none_or(|c| !is_word_char(c))
}

/// Attribute tokens in a stretch of prose; only known types are accepted.
fn prose_attributes(text: &str) -> Vec<AttributeToken<'_>> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(c) = text[pos..].chars().next() {
        if is_word_start(text, pos) && (c.is_ascii_lowercase() || c == '_') {
            let mut input = &text[pos..];
            if let Ok(token) = attribute_token(&mut input) {
                if at_word_end(input) && vocabulary::is_attribute_type(token.declared_type) {
                    pos = text.len() - input.len();
                    found.push(token);
                    continue;
                }
            }
        }
        pos += c.len_utf8();
    }
    found
}

/// An attribute token that fills a whole backtick span.
fn quoted_attribute(text: &str) -> Option<AttributeToken<'_>> {
    let mut input = text.trim();
    let token = attribute_token(&mut input).ok()?;
    let done: IResult<&str> = eof.parse_next(&mut input);
    done.ok().map(|_| token)
}

/// Attribute tokens in document order. Backtick spans are taken as-is;
/// everything else needs a recognised type.
fn attribute_tokens(body: &str) -> Vec<AttributeToken<'_>> {
    let segments: Vec<&str> = body.split('`').collect();
    // An odd number of backticks leaves the last span unclosed.
    let last_closed = if segments.len() % 2 == 0 {
        segments.len() - 1
    } else {
        segments.len()
    };

    let mut tokens = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        if i % 2 == 1 && i < last_closed {
            tokens.extend(quoted_attribute(segment));
        } else {
            tokens.extend(prose_attributes(segment));
        }
    }
    tokens
}

fn build_attributes(block: &EntityBlock, diagnostics: &mut DiagnosticCollector) -> Vec<AttributeRecord> {
    let mut attributes: Vec<AttributeRecord> = Vec::new();
    let mut has_primary_key = false;

    for token in attribute_tokens(&block.body) {
        if attributes.iter().any(|attr| attr.name() == token.name) {
            diagnostics.emit(
                Diagnostic::warning(format!(
                    "attribute `{}` of entity `{}` is declared more than once",
                    token.name, block.name
                ))
                .with_code(ErrorCode::E204)
                .with_label(block.span, "entity defined here")
                .with_help("the later declaration is ignored"),
            );
            continue;
        }

        let mut is_primary_key = token.marker == Some(KeyMarker::Primary) || token.name == "id";
        let is_foreign_key = token.marker == Some(KeyMarker::Foreign)
            || (!is_primary_key && token.name.ends_with("_id"));

        if is_primary_key && has_primary_key {
            diagnostics.emit(
                Diagnostic::warning(format!(
                    "entity `{}` declares more than one primary key",
                    block.name
                ))
                .with_code(ErrorCode::E202)
                .with_label(block.span, "entity defined here")
                .with_help(format!("`{}` is kept as a plain attribute", token.name)),
            );
            is_primary_key = false;
        }
        has_primary_key |= is_primary_key;

        attributes.push(
            AttributeRecord::new(token.name, token.declared_type)
                .with_primary_key(is_primary_key)
                .with_foreign_key(is_foreign_key),
        );
    }

    attributes
}

// =============================================================================
// Relationships
// =============================================================================

/// Remove emphasis markers and backticks so phrases read as plain prose.
fn strip_markup(text: &str) -> String {
    text.replace("**", "")
        .replace("__", "")
        .replace(['`', '*'], "")
}

/// Match the longest relationship phrase at the start of `input`.
fn relationship_phrase(input: &mut &str) -> Option<Phrase> {
    RELATIONSHIP_PHRASES.iter().copied().find(|phrase| {
        let mut attempt = *input;
        let matched: IResult<&str> = literal(Caseless(phrase.text)).parse_next(&mut attempt);
        if matched.is_ok() && at_word_end(attempt) {
            *input = attempt;
            true
        } else {
            false
        }
    })
}

/// Resolve the target after a phrase: up to [`MAX_FILLER_WORDS`] filler words,
/// then a known entity name matched exactly.
///
/// Returns the entity name and the number of bytes consumed, or the first
/// unrecognised word for the warning.
fn resolve_target<'k>(text: &str, known: &[&'k str]) -> Result<(&'k str, usize), String> {
    let mut input = text;
    let mut fillers = 0;
    loop {
        input = input.trim_start();
        if let Some(name) = known
            .iter()
            .find(|name| input.starts_with(**name) && at_word_end(&input[name.len()..]))
        {
            let consumed = text.len() - input.len() + name.len();
            return Ok((*name, consumed));
        }

        let word_len = input
            .find(|c: char| !c.is_alphanumeric())
            .unwrap_or(input.len());
        let word = &input[..word_len];
        if fillers == MAX_FILLER_WORDS || word.is_empty() || !vocabulary::is_filler_word(word) {
            return Err(if word.is_empty() {
                "end of sentence".to_string()
            } else {
                word.to_string()
            });
        }
        input = &input[word_len..];
        fillers += 1;
    }
}

/// A relationship found in prose, before conflict resolution.
#[derive(Debug, Clone)]
struct Candidate<'k> {
    target: &'k str,
    phrase: Phrase,
}

/// Scan `body` for relationship phrases. Unresolved references are returned
/// separately for reporting.
fn relationship_candidates<'k>(body: &str, known: &[&'k str]) -> (Vec<Candidate<'k>>, Vec<String>) {
    let text = strip_markup(body);
    let mut candidates = Vec::new();
    let mut unresolved = Vec::new();
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        if !is_word_start(&text, pos) {
            pos += c.len_utf8();
            continue;
        }
        let mut input = &text[pos..];
        let Some(phrase) = relationship_phrase(&mut input) else {
            pos += c.len_utf8();
            continue;
        };
        let after = text.len() - input.len();

        match resolve_target(input, known) {
            Ok((target, consumed)) => {
                candidates.push(Candidate { target, phrase });
                pos = after + consumed;
            }
            Err(reference) => {
                log::debug!(phrase = phrase.text, reference = reference.as_str(); "Relationship target not resolved");
                unresolved.push(format!("{} {reference}", phrase.text));
                pos = after;
            }
        }
    }

    (candidates, unresolved)
}

fn build_relationships(
    block: &EntityBlock,
    known: &[&str],
    diagnostics: &mut DiagnosticCollector,
) -> Vec<RelationshipRecord> {
    let (candidates, unresolved) = relationship_candidates(&block.body, known);

    for reference in unresolved {
        diagnostics.emit(
            Diagnostic::warning(format!(
                "entity `{}`: `{reference}` does not name a known entity",
                block.name
            ))
            .with_code(ErrorCode::E203)
            .with_label(block.span, "entity defined here")
            .with_help("relationships are only drawn to entities listed in this section"),
        );
    }

    let mut by_target: IndexMap<&str, Vec<Candidate<'_>>> = IndexMap::new();
    for candidate in candidates {
        by_target.entry(candidate.target).or_default().push(candidate);
    }

    let mut relationships = Vec::new();
    for (target, group) in by_target {
        let first = group[0].phrase.cardinality;
        if group.iter().any(|c| c.phrase.cardinality != first) {
            diagnostics.emit(
                Diagnostic::warning(format!(
                    "conflicting cardinalities between `{}` and `{target}`",
                    block.name
                ))
                .with_code(ErrorCode::E205)
                .with_label(block.span, "entity defined here")
                .with_help("no relationship is drawn for this pair"),
            );
            continue;
        }
        relationships.extend(group.into_iter().map(|candidate| {
            RelationshipRecord::new(
                block.name.as_str(),
                target,
                candidate.phrase.cardinality,
                candidate.phrase.label(),
            )
        }));
    }

    relationships
}

// =============================================================================
// Extraction
// =============================================================================

struct EntityExtractor {
    blocks: IndexMap<String, EntityBlock>,
    diagnostics: DiagnosticCollector,
}

impl EntityExtractor {
    fn new() -> Self {
        Self {
            blocks: IndexMap::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn close(&mut self, block: Option<EntityBlock>) {
        let Some(block) = block else {
            return;
        };
        if let Some(first) = self.blocks.get(&block.name) {
            self.diagnostics.emit(
                Diagnostic::warning(format!(
                    "entity `{}` is defined multiple times",
                    block.name
                ))
                .with_code(ErrorCode::E201)
                .with_label(block.span, "duplicate definition")
                .with_secondary_label(first.span, "first defined here")
                .with_help("the later definition is ignored"),
            );
            return;
        }
        self.blocks.insert(block.name.clone(), block);
    }

    fn collect_blocks(&mut self, section: &[Line<'_>]) {
        let mut current: Option<EntityBlock> = None;

        for line in section {
            if line.in_fence || line.is_blank() {
                continue;
            }
            if is_top_level_bullet(line) {
                let previous = current.take();
                self.close(previous);

                let mut input = line.text;
                match entity_bullet(&mut input) {
                    Ok((raw, description)) if !clean_name(raw).is_empty() => {
                        current = Some(EntityBlock::new(clean_name(raw), description, line.span()));
                    }
                    _ => {
                        self.diagnostics.emit(
                            Diagnostic::warning("entity bullet has no emphasised name")
                                .with_code(ErrorCode::E200)
                                .with_label(line.span(), "skipped")
                                .with_help("write the entity as `- **Name**: description`"),
                        );
                    }
                }
            } else if line.is_indented() {
                if let Some(block) = current.as_mut() {
                    block.push_line(line.text);
                }
            } else {
                let previous = current.take();
                self.close(previous);
            }
        }

        self.close(current);
    }

    fn extract(mut self, text: &str) -> EntityExtraction {
        let scanned = lines::scan(text);
        let Some(section) = key_entities_section(&scanned) else {
            log::debug!("No key entities section");
            return EntityExtraction::default();
        };

        self.collect_blocks(&section);

        let mut known: Vec<&str> = self.blocks.keys().map(String::as_str).collect();
        known.sort_by_key(|name| std::cmp::Reverse(name.len()));

        let mut records = Vec::with_capacity(self.blocks.len());
        for block in self.blocks.values() {
            let attributes = build_attributes(block, &mut self.diagnostics);
            let mut record =
                EntityRecord::new(block.name.as_str(), block.description.as_str())
                    .with_attributes(attributes);
            for relationship in build_relationships(block, &known, &mut self.diagnostics) {
                record.add_relationship(relationship);
            }
            records.push(record);
        }

        log::debug!(entities = records.len(); "Entity extraction finished");
        EntityExtraction {
            records,
            diagnostics: self.diagnostics.into_diagnostics(),
            section_found: true,
        }
    }
}

/// Extract key entities, their attributes, and their relationships.
///
/// Never fails. Entities are returned in document order; skipped bullets,
/// duplicates, and unresolved relationships are reported as warnings.
pub fn extract_entities(text: &str) -> EntityExtraction {
    EntityExtractor::new().extract(text)
}

#[cfg(test)]
mod tests {
    use specgram_core::entity::Cardinality;

    use super::*;

    fn codes(extraction: &EntityExtraction) -> Vec<ErrorCode> {
        extraction
            .diagnostics()
            .iter()
            .filter_map(Diagnostic::code)
            .collect()
    }

    #[test]
    fn test_entity_bullet_shapes() {
        let cases = [
            ("- **User**: An account", "User", "An account"),
            ("* __Order__ - A purchase", "Order", "A purchase"),
            ("+ *Line Item* — One row", "Line Item", "One row"),
            ("- **Product:** Something sold", "Product", "Something sold"),
        ];
        for (text, name, description) in cases {
            let mut input = text;
            let (raw, desc) = entity_bullet(&mut input).expect(text);
            assert_eq!(clean_name(raw), name);
            assert_eq!(desc.trim(), description);
        }

        let mut plain = "- User: no emphasis";
        assert!(entity_bullet(&mut plain).is_err());
    }

    #[test]
    fn test_attribute_tokens() {
        let tokens = attribute_tokens("Has `id: uuid`, `tags: Label[]` and email: string, note: widget");
        let names: Vec<(&str, &str)> = tokens.iter().map(|t| (t.name, t.declared_type)).collect();

        assert_eq!(
            names,
            vec![("id", "uuid"), ("tags", "Label[]"), ("email", "string")]
        );
    }

    #[test]
    fn test_attribute_key_markers() {
        let tokens = attribute_tokens("`code: string PK` and `owner: uuid FK`");

        assert_eq!(tokens[0].marker, Some(KeyMarker::Primary));
        assert_eq!(tokens[1].marker, Some(KeyMarker::Foreign));
    }

    #[test]
    fn test_resolve_target() {
        let known = ["OrderItem", "Order", "User"];

        assert_eq!(resolve_target(" Order records", &known), Ok(("Order", 6)));
        assert_eq!(resolve_target(" the User", &known), Ok(("User", 9)));
        assert_eq!(resolve_target(" many OrderItem", &known).map(|r| r.0), Ok("OrderItem"));
        assert_eq!(
            resolve_target(" preferences", &known),
            Err("preferences".to_string())
        );
        assert!(resolve_target(" Orders", &known).is_err());
        assert!(resolve_target(" a the one of User", &known).is_err());
    }

    #[test]
    fn test_extract_entities() {
        let text = "\
# Feature

## Key Entities

- **User**: A registered account with `id: uuid` and `email: string`.
  Has many Order records.
- **Order**: A purchase with `id: uuid` and `user_id: uuid`. Belongs to User.

## Next Section

- **Ignored**: outside the section
";
        let extraction = extract_entities(text);

        assert!(extraction.section_found());
        assert!(extraction.diagnostics().is_empty());
        let records = extraction.records();
        assert_eq!(records.len(), 2);

        let user = &records[0];
        assert_eq!(user.name(), "User");
        assert_eq!(user.primary_key().map(AttributeRecord::name), Some("id"));
        assert_eq!(user.relationships().len(), 1);
        assert_eq!(user.relationships()[0].target_entity(), "Order");
        assert_eq!(user.relationships()[0].cardinality(), Cardinality::OneToMany);
        assert_eq!(user.relationships()[0].label(), "has many");

        let order = &records[1];
        assert!(order.attributes()[1].is_foreign_key());
        assert_eq!(order.relationships()[0].cardinality(), Cardinality::ManyToOne);
    }

    #[test]
    fn test_degraded_entities_warn() {
        let text = "\
### Key Entities
- Plain bullet without a name
- **User**: `id: uuid`, `code: string PK`, `id: int`. Has many Widgets.
- **Order**: Belongs to User. Has many User.
- **User**: again
";
        let extraction = extract_entities(text);

        assert_eq!(extraction.records().len(), 2);
        let user = &extraction.records()[0];
        assert_eq!(user.attributes().len(), 2);
        assert!(!user.attributes()[1].is_primary_key());
        assert!(extraction.records()[1].relationships().is_empty());
        assert_eq!(
            codes(&extraction),
            vec![
                ErrorCode::E200,
                ErrorCode::E201,
                ErrorCode::E202,
                ErrorCode::E204,
                ErrorCode::E203,
                ErrorCode::E205,
            ]
        );
    }

    #[test]
    fn test_missing_section() {
        let extraction = extract_entities("# Feature\n\n- **User**: not in a section\n");

        assert!(!extraction.section_found());
        assert!(extraction.records().is_empty());
    }
}
