//! Document outline: the ATX headings outside fenced code blocks.
//!
//! The rewrite stage uses the outline to find where a missing managed region
//! should be inserted.

use std::ops::Range;

use crate::lines;

/// A heading line and its byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeading {
    level: usize,
    title: String,
    line: Range<usize>,
}

impl SectionHeading {
    /// Heading level, `1` for `#`.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Byte range of the whole line, including its line break.
    pub fn line(&self) -> Range<usize> {
        self.line.clone()
    }
}

/// Every heading of `text` in document order.
pub fn section_headings(text: &str) -> Vec<SectionHeading> {
    lines::scan(text)
        .iter()
        .filter_map(|line| {
            lines::heading(line).map(|heading| SectionHeading {
                level: heading.level,
                title: heading.text.to_string(),
                line: line.start..line.end,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_headings() {
        let text = "# Spec\n\n## Key Entities\n```\n## not a heading\n```\n### Notes\n";
        let headings = section_headings(text);

        let outline: Vec<(usize, &str)> = headings.iter().map(|h| (h.level(), h.title())).collect();
        assert_eq!(outline, vec![(1, "Spec"), (2, "Key Entities"), (3, "Notes")]);
        assert_eq!(&text[headings[1].line()], "## Key Entities\n");
    }
}
