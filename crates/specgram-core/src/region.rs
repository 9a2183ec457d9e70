//! Managed regions of a document.
//!
//! A managed region is the span between a begin marker and its matching end
//! marker. Its content is owned by the engine and replaced wholesale on each
//! run; everything outside regions is left byte-for-byte untouched.

use std::ops::Range;

/// A named, marker-delimited span of a document.
///
/// Offsets are byte offsets into the document the region was located in.
/// `start_offset` is the first byte of the begin-marker line and
/// `end_offset` is one past the last byte of the end-marker line (including
/// its line break), or the document length when the region is unterminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRegion {
    name: String,
    start_offset: usize,
    end_offset: usize,
    content_range: Range<usize>,
    current_content: String,
    terminated: bool,
}

impl ManagedRegion {
    /// Create a region.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the offsets are out of order.
    pub fn new(
        name: impl Into<String>,
        start_offset: usize,
        end_offset: usize,
        content_range: Range<usize>,
        current_content: impl Into<String>,
        terminated: bool,
    ) -> Self {
        debug_assert!(start_offset < end_offset, "region must not be empty");
        debug_assert!(
            start_offset <= content_range.start && content_range.end <= end_offset,
            "content must lie within the region"
        );
        Self {
            name: name.into(),
            start_offset,
            end_offset,
            content_range,
            current_content: current_content.into(),
            terminated,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    /// The full byte range of the region, markers included.
    pub fn range(&self) -> Range<usize> {
        self.start_offset..self.end_offset
    }

    /// The byte range between the begin-marker line and the end-marker line.
    pub fn content_range(&self) -> Range<usize> {
        self.content_range.clone()
    }

    pub fn current_content(&self) -> &str {
        &self.current_content
    }

    /// Returns `false` if the region had no end marker and runs to the end of the document.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Returns `true` if `offset` falls inside the region, markers included.
    pub fn contains(&self, offset: usize) -> bool {
        self.range().contains(&offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_accessors() {
        let region = ManagedRegion::new("journey", 10, 50, 20..40, "body", true);

        assert_eq!(region.name(), "journey");
        assert_eq!(region.range(), 10..50);
        assert_eq!(region.content_range(), 20..40);
        assert_eq!(region.current_content(), "body");
        assert!(region.is_terminated());
        assert!(region.contains(10));
        assert!(region.contains(49));
        assert!(!region.contains(50));
    }
}
