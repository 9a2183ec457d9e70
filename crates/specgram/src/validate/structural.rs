//! Structural checks for generated Mermaid markup.
//!
//! These checks need no external tooling. They catch a wrong or missing
//! declaration, unbalanced brackets and quotes, unclosed subgraphs, and
//! identifiers Mermaid would reject. Passing them does not guarantee that
//! Mermaid renders the diagram.

use winnow::{
    ModalResult, Parser,
    ascii::{space0, space1},
    combinator::{alt, eof, opt, preceded},
};

use specgram_core::{
    diagram::{DiagramKind, ValidationVerdict},
    entity::Cardinality,
};

type IResult<O> = ModalResult<O>;

/// A non-blank, non-comment line with its 1-based line number.
type Numbered<'a> = (usize, &'a str);

const FLOWCHART_DIRECTIVES: &[&str] = &["direction", "classDef", "class", "style", "linkStyle", "click"];
const FLOWCHART_ARROWS: &[&str] = &["-.->", "-->", "---", "==>"];
const KEY_MARKERS: &[&str] = &["PK", "FK", "UK"];

/// Check `markup` against the grammar of `kind`.
///
/// Every problem found is reported as an error on the verdict; this tier
/// never produces warnings.
pub fn check(markup: &str, kind: DiagramKind) -> ValidationVerdict {
    let lines: Vec<Numbered<'_>> = markup
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("%%")
        })
        .collect();

    let Some(&(first_number, first_line)) = lines.first() else {
        return ValidationVerdict::new(vec!["diagram is empty".to_string()], Vec::new());
    };

    let mut errors = Vec::new();
    match declaration(first_line.trim()) {
        Some(found) if found == kind => {}
        Some(found) => {
            errors.push(format!(
                "line {first_number}: expected a `{}` declaration, found `{}`",
                keyword(kind),
                keyword(found)
            ));
            return ValidationVerdict::new(errors, Vec::new());
        }
        None => {
            errors.push(format!(
                "line {first_number}: expected a `{}` declaration, found `{}`",
                keyword(kind),
                first_line.trim()
            ));
            return ValidationVerdict::new(errors, Vec::new());
        }
    }

    let body = &lines[1..];
    check_delimiters(body, kind, &mut errors);
    match kind {
        DiagramKind::Journey => check_flowchart(body, &mut errors),
        DiagramKind::EntityRelationship => check_entity_relationship(body, &mut errors),
    }
    ValidationVerdict::new(errors, Vec::new())
}

fn keyword(kind: DiagramKind) -> &'static str {
    match kind {
        DiagramKind::Journey => "flowchart",
        DiagramKind::EntityRelationship => "erDiagram",
    }
}

/// Parse a diagram declaration line.
fn declaration(line: &str) -> Option<DiagramKind> {
    let mut input = line;
    let parsed: IResult<DiagramKind> = alt((
        (
            alt(("flowchart", "graph")),
            opt(preceded(space1, alt(("TD", "TB", "BT", "RL", "LR")))),
            space0,
            eof,
        )
            .value(DiagramKind::Journey),
        ("erDiagram", space0, eof).value(DiagramKind::EntityRelationship),
    ))
    .parse_next(&mut input);
    parsed.ok()
}

// ===========================================================================
// Delimiters
// ===========================================================================

fn closer(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Brackets must nest across the whole body; quotes must close on the line
/// they open.
fn check_delimiters(lines: &[Numbered<'_>], kind: DiagramKind, errors: &mut Vec<String>) {
    let mut open: Vec<(char, usize)> = Vec::new();

    for &(number, line) in lines {
        let view = match kind {
            DiagramKind::Journey => line.to_string(),
            DiagramKind::EntityRelationship => without_cardinality(line),
        };

        let mut quoted = false;
        for c in view.chars() {
            if c == '"' {
                quoted = !quoted;
                continue;
            }
            if quoted {
                continue;
            }
            match c {
                '(' | '[' | '{' => open.push((c, number)),
                ')' | ']' | '}' => match open.pop() {
                    Some((opener, _)) if closer(opener) == c => {}
                    Some((opener, at)) => {
                        errors.push(format!(
                            "line {number}: `{c}` does not close `{opener}` opened on line {at}"
                        ));
                        return;
                    }
                    None => {
                        errors.push(format!("line {number}: unmatched `{c}`"));
                        return;
                    }
                },
                _ => {}
            }
        }

        if quoted {
            errors.push(format!("line {number}: unterminated quote"));
        }
    }

    if let Some((opener, at)) = open.first() {
        errors.push(format!("line {at}: `{opener}` is never closed"));
    }
}

/// Blank out the cardinality token of a relationship line; its braces are
/// not brackets.
fn without_cardinality(line: &str) -> String {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [_, token, _, ..] if token.contains("--") || token.contains("..") => {
            line.replacen(token, " ", 1)
        }
        _ => line.to_string(),
    }
}

/// Replace quoted text with `x` so arrows and brackets inside labels are
/// not mistaken for syntax.
fn mask_quoted(line: &str) -> String {
    let mut quoted = false;
    line.chars()
        .map(|c| {
            if c == '"' {
                quoted = !quoted;
                c
            } else if quoted {
                'x'
            } else {
                c
            }
        })
        .collect()
}

// ===========================================================================
// Flowchart
// ===========================================================================

fn is_flowchart_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_flowchart(lines: &[Numbered<'_>], errors: &mut Vec<String>) {
    let mut depth = 0usize;

    for &(number, line) in lines {
        let trimmed = line.trim();

        if trimmed == "end" {
            if depth == 0 {
                errors.push(format!("line {number}: `end` without an open subgraph"));
            } else {
                depth -= 1;
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("subgraph") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                depth += 1;
                check_flowchart_node(number, &mask_quoted(rest), errors);
                continue;
            }
        }

        let first_word = trimmed.split_whitespace().next().unwrap_or_default();
        if FLOWCHART_DIRECTIVES.contains(&first_word) {
            continue;
        }

        let mut statement = mask_quoted(trimmed);
        for arrow in FLOWCHART_ARROWS {
            statement = statement.replace(arrow, "\u{0}");
        }
        for segment in statement.split('\u{0}') {
            check_flowchart_node(number, segment, errors);
        }
    }

    if depth > 0 {
        errors.push(format!("{depth} subgraph(s) never closed with `end`"));
    }
}

/// Check the identifier at the start of a node reference such as
/// `|label| A["text"]`.
fn check_flowchart_node(number: usize, segment: &str, errors: &mut Vec<String>) {
    let mut segment = segment.trim();
    if let Some(rest) = segment.strip_prefix('|') {
        segment = match rest.split_once('|') {
            Some((_, after)) => after.trim(),
            None => {
                errors.push(format!("line {number}: unterminated edge label"));
                return;
            }
        };
    }

    let id = segment
        .split(['[', '(', '{', '>'])
        .next()
        .unwrap_or_default()
        .split(":::")
        .next()
        .unwrap_or_default()
        .trim();
    if id.is_empty() {
        errors.push(format!("line {number}: node without an identifier"));
    } else if !is_flowchart_id(id) {
        errors.push(format!("line {number}: invalid node identifier `{id}`"));
    }
}

// ===========================================================================
// Entity relationship
// ===========================================================================

fn is_er_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_er_type(ty: &str) -> bool {
    let mut chars = ty.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '[' | ']'))
}

fn check_entity_name(number: usize, name: &str, errors: &mut Vec<String>) {
    if !is_er_name(name) {
        errors.push(format!("line {number}: invalid entity name `{name}`"));
    }
}

fn check_entity_relationship(lines: &[Numbered<'_>], errors: &mut Vec<String>) {
    let mut in_block = false;

    for &(number, line) in lines {
        let trimmed = line.trim();

        if in_block {
            if trimmed == "}" {
                in_block = false;
            } else {
                check_attribute(number, trimmed, errors);
            }
            continue;
        }

        if let Some(name) = trimmed.strip_suffix('{') {
            check_entity_name(number, name.trim(), errors);
            in_block = true;
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        match tokens.as_slice() {
            [name] => check_entity_name(number, name, errors),
            [source, token, target, label @ ..] => {
                check_entity_name(number, source, errors);
                check_entity_name(number, target, errors);
                if Cardinality::from_mermaid_token(token).is_none() {
                    errors.push(format!("line {number}: unknown relationship token `{token}`"));
                }
                let has_label = label
                    .first()
                    .is_some_and(|first| first.starts_with(':') && (first.len() > 1 || label.len() > 1));
                if !has_label {
                    errors.push(format!("line {number}: relationship without a `: label`"));
                }
            }
            _ => errors.push(format!("line {number}: unrecognized statement `{trimmed}`")),
        }
    }
}

/// `type name [PK|FK|UK[, ...]] ["comment"]`
fn check_attribute(number: usize, line: &str, errors: &mut Vec<String>) {
    let declaration = match line.find('"') {
        Some(quote) => &line[..quote],
        None => line,
    };
    let tokens: Vec<&str> = declaration.split_whitespace().collect();
    let [ty, name, keys @ ..] = tokens.as_slice() else {
        errors.push(format!("line {number}: attribute needs a type and a name"));
        return;
    };

    if !is_er_type(ty) {
        errors.push(format!("line {number}: invalid attribute type `{ty}`"));
    }
    if !is_er_name(name) {
        errors.push(format!("line {number}: invalid attribute name `{name}`"));
    }
    let keys = keys.concat();
    for key in keys.split(',').filter(|key| !key.is_empty()) {
        if !KEY_MARKERS.contains(&key) {
            errors.push(format!("line {number}: unknown key marker `{key}`"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOURNEY: &str = "\
flowchart TD
    subgraph story_1[\"US1: Browse (P1)\"]
        1_A[\"Given a visitor\"]
        1_B{\"When they click --> here\"}
        1_C([\"Then (it) works\"])
        1_A --> 1_B
        1_B --> 1_C
    end
";

    const ENTITIES: &str = "\
erDiagram
    User {
        uuid id PK
        string[] tags
        uuid org_id FK \"owning org\"
    }
    Order {
        uuid id PK, FK
    }
    Audit_Log
    User ||--o{ Order : \"has many\"
    Order }o--|| User : \"belongs to\"
";

    fn errors(markup: &str, kind: DiagramKind) -> Vec<String> {
        check(markup, kind).errors().to_vec()
    }

    #[test]
    fn test_valid_journey() {
        assert_eq!(errors(JOURNEY, DiagramKind::Journey), Vec::<String>::new());
    }

    #[test]
    fn test_valid_entity_relationship() {
        assert_eq!(
            errors(ENTITIES, DiagramKind::EntityRelationship),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_declarations() {
        assert_eq!(declaration("flowchart LR"), Some(DiagramKind::Journey));
        assert_eq!(declaration("graph"), Some(DiagramKind::Journey));
        assert_eq!(
            declaration("erDiagram  "),
            Some(DiagramKind::EntityRelationship)
        );
        assert_eq!(declaration("flowchart XY"), None);
        assert_eq!(declaration("sequenceDiagram"), None);
    }

    #[test]
    fn test_empty_markup() {
        assert_eq!(errors("  \n\n", DiagramKind::Journey), vec!["diagram is empty"]);
    }

    #[test]
    fn test_kind_mismatch() {
        let found = errors(ENTITIES, DiagramKind::Journey);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("expected a `flowchart` declaration"));
    }

    #[test]
    fn test_unbalanced_bracket() {
        let markup = "flowchart TD\n    A[\"text\" --> B\n";
        let found = errors(markup, DiagramKind::Journey);
        assert!(found.iter().any(|e| e.contains("never closed")));
    }

    #[test]
    fn test_mismatched_bracket() {
        let markup = "flowchart TD\n    A[\"text\") --> B\n";
        let found = errors(markup, DiagramKind::Journey);
        assert!(found[0].starts_with("line 2: `)` does not close `[`"));
    }

    #[test]
    fn test_unterminated_quote() {
        let markup = "flowchart TD\n    A[\"text] --> B\n";
        let found = errors(markup, DiagramKind::Journey);
        assert!(found.iter().any(|e| e == "line 2: unterminated quote"));
    }

    #[test]
    fn test_unclosed_subgraph() {
        let markup = "flowchart TD\n    subgraph one\n        A --> B\n";
        let found = errors(markup, DiagramKind::Journey);
        assert_eq!(found, vec!["1 subgraph(s) never closed with `end`"]);

        let stray = errors("flowchart TD\n    A --> B\n    end\n", DiagramKind::Journey);
        assert_eq!(stray, vec!["line 3: `end` without an open subgraph"]);
    }

    #[test]
    fn test_invalid_node_identifier() {
        let markup = "flowchart TD\n    node-1[\"x\"] -->|go| node.2\n";
        let found = errors(markup, DiagramKind::Journey);
        assert_eq!(
            found,
            vec![
                "line 2: invalid node identifier `node-1`",
                "line 2: invalid node identifier `node.2`",
            ]
        );
    }

    #[test]
    fn test_unknown_relationship_token() {
        let markup = "erDiagram\n    A <--> B : \"x\"\n";
        let found = errors(markup, DiagramKind::EntityRelationship);
        assert_eq!(found, vec!["line 2: unknown relationship token `<-->`"]);
    }

    #[test]
    fn test_relationship_needs_label() {
        let markup = "erDiagram\n    A ||--|| B\n";
        let found = errors(markup, DiagramKind::EntityRelationship);
        assert_eq!(found, vec!["line 2: relationship without a `: label`"]);
    }

    #[test]
    fn test_bad_attribute() {
        let markup = "erDiagram\n    A {\n        9int count\n        string name XK\n        lonely\n    }\n";
        let found = errors(markup, DiagramKind::EntityRelationship);
        assert_eq!(
            found,
            vec![
                "line 3: invalid attribute type `9int`",
                "line 4: unknown key marker `XK`",
                "line 5: attribute needs a type and a name",
            ]
        );
    }
}
