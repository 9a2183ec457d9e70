//! Region rewriting.
//!
//! Given the located regions and the diagrams to commit, produce the new
//! document text. Only region content is replaced; a region that does not
//! exist yet is inserted at its anchor. Every byte outside a region is
//! copied through unchanged.

use std::ops::Range;

use log::{debug, trace};

use specgram_core::{
    diagram::{DiagramKind, GeneratedDiagram},
    region::ManagedRegion,
};
use specgram_parser::{
    RegionMap,
    region::{begin_marker, end_marker},
    section_headings,
};

use crate::{
    config::{AnchorConfig, AnchorsConfig, Placement},
    report::RegionAction,
};

/// Wrap `markup` in a fenced `mermaid` code block ending in a line break.
pub fn fenced_block(markup: &str) -> String {
    let mut block = String::from("```mermaid\n");
    block.push_str(markup);
    if !markup.ends_with('\n') {
        block.push('\n');
    }
    block.push_str("```\n");
    block
}

/// The rewritten document and what happened to each diagram's region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    text: String,
    actions: Vec<(DiagramKind, RegionAction)>,
}

impl Rewrite {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn actions(&self) -> &[(DiagramKind, RegionAction)] {
        &self.actions
    }

    /// Returns the action taken for `kind`, if it was rewritten at all.
    pub fn action(&self, kind: DiagramKind) -> Option<RegionAction> {
        self.actions
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, action)| *action)
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

enum Edit {
    Replace { range: Range<usize>, text: String },
    Insert { at: usize, block: String },
}

impl Edit {
    fn offset(&self) -> usize {
        match self {
            Edit::Replace { range, .. } => range.start,
            Edit::Insert { at, .. } => *at,
        }
    }
}

/// Rewrite `source` so each diagram's region holds its markup.
///
/// `regions` must have been located in `source`.
pub fn rewrite(
    source: &str,
    regions: &RegionMap,
    diagrams: &[GeneratedDiagram],
    anchors: &AnchorsConfig,
) -> Rewrite {
    let mut edits = Vec::new();
    let mut actions = Vec::new();

    for diagram in diagrams {
        let kind = diagram.kind();
        let block = fenced_block(diagram.markup_text());

        let action = match regions.get(kind.region_name()) {
            Some(region) => match replace_content(source, region, &block) {
                Some(edit) => {
                    edits.push(edit);
                    RegionAction::Replaced
                }
                None => RegionAction::Unchanged,
            },
            None => {
                let at = insertion_offset(source, regions.regions(), anchors.for_kind(kind));
                let mut region_text = begin_marker(kind.region_name());
                region_text.push('\n');
                region_text.push_str(&block);
                region_text.push_str(&end_marker(kind.region_name()));
                region_text.push('\n');
                edits.push(Edit::Insert {
                    at,
                    block: region_text,
                });
                RegionAction::Inserted
            }
        };
        debug!(kind:% = kind, action:% = action; "Region rewrite planned");
        actions.push((kind, action));
    }

    Rewrite {
        text: apply(source, edits),
        actions,
    }
}

fn replace_content(source: &str, region: &ManagedRegion, block: &str) -> Option<Edit> {
    if region.is_terminated() && region.current_content() == block {
        return None;
    }

    let range = region.content_range();
    let mut text = String::new();
    if !source[..range.start].ends_with('\n') {
        text.push('\n');
    }
    text.push_str(block);
    if !region.is_terminated() {
        text.push_str(&end_marker(region.name()));
        text.push('\n');
    }
    Some(Edit::Replace { range, text })
}

/// Where a missing region for `anchor` goes.
///
/// Headings inside existing regions are ignored, and a point that falls
/// inside a region is moved to just before it.
fn insertion_offset(source: &str, regions: &[ManagedRegion], anchor: &AnchorConfig) -> usize {
    let in_region = |offset: usize| regions.iter().find(|region| region.contains(offset));

    let headings: Vec<_> = section_headings(source)
        .into_iter()
        .filter(|heading| in_region(heading.line().start).is_none())
        .collect();

    let needle = anchor.heading().to_lowercase();
    let Some(index) = headings
        .iter()
        .position(|heading| heading.title().to_lowercase().contains(&needle))
    else {
        debug!(anchor = anchor.heading(); "Anchor heading not found, appending region");
        return source.len();
    };

    let heading = &headings[index];
    let at = match anchor.placement() {
        Placement::AfterHeading => heading.line().end,
        Placement::EndOfSection => headings[index + 1..]
            .iter()
            .find(|next| next.level() <= heading.level())
            .map_or(source.len(), |next| next.line().start),
    };

    in_region(at).map_or(at, |region| region.start_offset())
}

/// Apply edits in offset order. Insertions at the same offset keep their
/// relative order and are separated from their neighbours by a blank line.
fn apply(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(Edit::offset);

    let mut text = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        match edit {
            Edit::Replace {
                range,
                text: replacement,
            } => {
                text.push_str(&source[cursor..range.start]);
                text.push_str(&replacement);
                cursor = range.end;
            }
            Edit::Insert { at, block } => {
                text.push_str(&source[cursor..at]);
                cursor = at;
                if text.ends_with('\n') {
                    if !text.ends_with("\n\n") {
                        text.push('\n');
                    }
                } else if !text.is_empty() {
                    text.push_str("\n\n");
                }
                text.push_str(&block);
                if at < source.len() {
                    text.push('\n');
                }
            }
        }
    }
    text.push_str(&source[cursor..]);
    trace!(len = text.len(); "Document rewritten");
    text
}

#[cfg(test)]
mod tests {
    use specgram_core::diagram::ValidationVerdict;
    use specgram_parser::locate_regions;

    use super::*;

    fn journey(markup: &str) -> GeneratedDiagram {
        GeneratedDiagram::new(DiagramKind::Journey, markup, 1, ValidationVerdict::pass())
    }

    fn entities(markup: &str) -> GeneratedDiagram {
        GeneratedDiagram::new(
            DiagramKind::EntityRelationship,
            markup,
            1,
            ValidationVerdict::pass(),
        )
    }

    fn run(source: &str, diagrams: &[GeneratedDiagram]) -> Rewrite {
        let regions = locate_regions(source).expect("unambiguous regions");
        rewrite(source, &regions, diagrams, &AnchorsConfig::default())
    }

    #[test]
    fn test_fenced_block() {
        assert_eq!(fenced_block("flowchart TD\n"), "```mermaid\nflowchart TD\n```\n");
        assert_eq!(fenced_block("flowchart TD"), "```mermaid\nflowchart TD\n```\n");
    }

    #[test]
    fn test_replaces_region_content_only() {
        let source = concat!(
            "# Spec\n",
            "<!-- specgram:begin section=\"journey\" -->\n",
            "stale\n",
            "<!-- specgram:end section=\"journey\" -->\n",
            "trailing text\n",
        );
        let result = run(source, &[journey("flowchart TD\n")]);

        let expected = concat!(
            "# Spec\n",
            "<!-- specgram:begin section=\"journey\" -->\n",
            "```mermaid\nflowchart TD\n```\n",
            "<!-- specgram:end section=\"journey\" -->\n",
            "trailing text\n",
        );
        assert_eq!(result.text(), expected);
        assert_eq!(result.action(DiagramKind::Journey), Some(RegionAction::Replaced));
    }

    #[test]
    fn test_unchanged_region() {
        let source = concat!(
            "<!-- specgram:begin section=\"journey\" -->\n",
            "```mermaid\nflowchart TD\n```\n",
            "<!-- specgram:end section=\"journey\" -->\n",
        );
        let result = run(source, &[journey("flowchart TD\n")]);

        assert_eq!(result.text(), source);
        assert_eq!(result.action(DiagramKind::Journey), Some(RegionAction::Unchanged));
    }

    #[test]
    fn test_unterminated_region_gets_end_marker() {
        let source = "intro\n<!-- specgram:begin section=\"journey\" -->\nold";
        let result = run(source, &[journey("flowchart TD\n")]);

        let expected = concat!(
            "intro\n",
            "<!-- specgram:begin section=\"journey\" -->\n",
            "```mermaid\nflowchart TD\n```\n",
            "<!-- specgram:end section=\"journey\" -->\n",
        );
        assert_eq!(result.text(), expected);
    }

    #[test]
    fn test_inserts_at_end_of_anchor_section() {
        let source = concat!(
            "## User Scenarios & Testing\n",
            "\n",
            "### User Story 1\n",
            "text\n",
            "## Requirements\n",
        );
        let result = run(source, &[journey("flowchart TD\n")]);

        let expected = concat!(
            "## User Scenarios & Testing\n",
            "\n",
            "### User Story 1\n",
            "text\n",
            "\n",
            "<!-- specgram:begin section=\"journey\" -->\n",
            "```mermaid\nflowchart TD\n```\n",
            "<!-- specgram:end section=\"journey\" -->\n",
            "\n",
            "## Requirements\n",
        );
        assert_eq!(result.text(), expected);
        assert_eq!(result.action(DiagramKind::Journey), Some(RegionAction::Inserted));
    }

    #[test]
    fn test_after_heading_placement() {
        let source = "## Key Entities\n\n- **User**: a person\n";
        let regions = locate_regions(source).expect("no markers");
        let anchors = AnchorsConfig::new(
            AnchorConfig::new("User Scenarios", Placement::EndOfSection),
            AnchorConfig::new("key entities", Placement::AfterHeading),
        );
        let result = rewrite(source, &regions, &[entities("erDiagram\n")], &anchors);

        assert!(result.text().starts_with(concat!(
            "## Key Entities\n",
            "\n",
            "<!-- specgram:begin section=\"entity-relationship\" -->\n",
        )));
        assert!(result.text().ends_with("\n\n- **User**: a person\n"));
    }

    #[test]
    fn test_missing_anchor_appends() {
        let source = "# Title\nbody";
        let result = run(source, &[journey("flowchart TD\n"), entities("erDiagram\n")]);

        let expected = concat!(
            "# Title\nbody\n\n",
            "<!-- specgram:begin section=\"journey\" -->\n",
            "```mermaid\nflowchart TD\n```\n",
            "<!-- specgram:end section=\"journey\" -->\n",
            "\n",
            "<!-- specgram:begin section=\"entity-relationship\" -->\n",
            "```mermaid\nerDiagram\n```\n",
            "<!-- specgram:end section=\"entity-relationship\" -->\n",
        );
        assert_eq!(result.text(), expected);
    }

    #[test]
    fn test_insertion_skips_existing_region() {
        let source = concat!(
            "## User Scenarios\n",
            "<!-- specgram:begin section=\"entity-relationship\" -->\n",
            "```mermaid\n",
            "erDiagram\n",
            "```\n",
            "## Trailing heading inside region\n",
            "<!-- specgram:end section=\"entity-relationship\" -->\n",
        );
        let result = run(source, &[journey("flowchart TD\n")]);
        let text = result.text();

        let journey_start = text.find("specgram:begin section=\"journey\"").expect("inserted");
        let er_start = text
            .find("specgram:begin section=\"entity-relationship\"")
            .expect("kept");
        assert!(journey_start > er_start);
        assert!(text.ends_with("<!-- specgram:end section=\"journey\" -->\n"));
    }
}
