//! Label escaping and identifier generation shared by the synthesizers.

use std::collections::HashSet;

/// Escape text for use inside a quoted Mermaid label.
///
/// `#` becomes `#35;` so label text is never read as an entity code, double
/// quotes become `#quot;`, and line breaks collapse to single spaces.
pub fn escape_label(text: &str) -> String {
    let joined = text
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    joined.trim().replace('#', "#35;").replace('"', "#quot;")
}

/// Bijective base-26 letters for a zero-based index: `A`..`Z`, `AA`, `AB`, ...
pub fn node_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Mermaid-safe entity identifiers, one per name and in the same order.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`; a leading digit or dash
/// gets an `_` prefix. Collisions are resolved with `_2`, `_3`, ... suffixes.
pub fn entity_ids<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let base = sanitize_id(name);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}

fn sanitize_id(name: &str) -> String {
    let mut id: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if id.is_empty() || id.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        id.insert(0, '_');
    }
    id
}
