//! Managed-region locator.
//!
//! Regions are delimited by HTML comment markers on their own lines:
//!
//! ```text
//! <!-- specgram:begin section="journey" -->
//! ...
//! <!-- specgram:end section="journey" -->
//! ```
//!
//! Marker lines are recognised everywhere, including inside fenced code
//! blocks, so an unclosed fence inside a region never hides its end marker.

use std::collections::HashMap;

use winnow::{
    Parser as _,
    ascii::{space0, space1},
    combinator::{alt, delimited, eof},
    error::ModalResult,
    token::take_while,
};

use specgram_core::region::ManagedRegion;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    lines::{self, Line},
    span::Span,
};

/// Which side of a region a marker line opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Begin,
    End,
}

/// Render the begin marker line for `name`, without a line break.
pub fn begin_marker(name: &str) -> String {
    format!("<!-- specgram:begin section=\"{name}\" -->")
}

/// Render the end marker line for `name`, without a line break.
pub fn end_marker(name: &str) -> String {
    format!("<!-- specgram:end section=\"{name}\" -->")
}

/// Returns `true` if `name` is usable as a section name.
pub fn is_valid_section_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_section_char)
}

fn is_section_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn section_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_while(1.., is_section_char), '"'),
        take_while(1.., is_section_char),
    ))
    .parse_next(input)
}

/// Parse a complete marker line.
///
/// A bare (unquoted) name must be followed by whitespace before `-->`,
/// otherwise the dashes are read as part of the name.
fn marker<'a>(input: &mut &'a str) -> ModalResult<(MarkerKind, &'a str)> {
    (space0, "<!--", space0, "specgram:").parse_next(input)?;
    let kind = alt(("begin".value(MarkerKind::Begin), "end".value(MarkerKind::End)))
        .parse_next(input)?;
    (space1, "section", space0, '=', space0).parse_next(input)?;
    let name = section_name.parse_next(input)?;
    (space0, "-->", space0, eof).parse_next(input)?;
    Ok((kind, name))
}

fn parse_marker<'a>(line: &Line<'a>) -> Option<(MarkerKind, &'a str)> {
    let mut input = line.text;
    marker(&mut input).ok()
}

/// Every managed region of a document, in document order.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    regions: Vec<ManagedRegion>,
    diagnostics: Vec<Diagnostic>,
}

impl RegionMap {
    pub fn regions(&self) -> &[ManagedRegion] {
        &self.regions
    }

    /// Look up a region by section name.
    pub fn get(&self, name: &str) -> Option<&ManagedRegion> {
        self.regions.iter().find(|region| region.name() == name)
    }

    /// Non-fatal diagnostics (stray end markers, unterminated regions).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Vec<ManagedRegion>, Vec<Diagnostic>) {
        (self.regions, self.diagnostics)
    }
}

/// A begin marker that has not been closed yet.
struct OpenRegion<'a> {
    name: &'a str,
    start: usize,
    content_start: usize,
    span: Span,
}

/// Locator state: regions found so far and the diagnostics they produced.
struct Locator<'a> {
    text: &'a str,
    regions: Vec<ManagedRegion>,
    open: Option<OpenRegion<'a>>,
    first_seen: HashMap<&'a str, Span>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Locator<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            regions: Vec::new(),
            open: None,
            first_seen: HashMap::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn begin(&mut self, line: &Line<'a>, name: &'a str) {
        if let Some(open) = &self.open {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "region `{name}` begins inside region `{}`",
                    open.name
                ))
                .with_code(ErrorCode::E002)
                .with_label(line.span(), "nested begin marker")
                .with_secondary_label(open.span, "enclosing region opened here")
                .with_help("close the enclosing region before opening another one"),
            );
            return;
        }

        if let Some(first) = self.first_seen.get(name) {
            self.diagnostics.emit(
                Diagnostic::error(format!("region `{name}` is defined multiple times"))
                    .with_code(ErrorCode::E001)
                    .with_label(line.span(), "duplicate begin marker")
                    .with_secondary_label(*first, "first defined here")
                    .with_help("remove one of the regions so the rewrite target is unambiguous"),
            );
        } else {
            self.first_seen.insert(name, line.span());
        }

        self.open = Some(OpenRegion {
            name,
            start: line.start,
            content_start: line.end,
            span: line.span(),
        });
    }

    fn end(&mut self, line: &Line<'a>, name: &'a str) {
        match self.open.take() {
            Some(open) if open.name == name => {
                self.push(&open, line.start, line.end, true);
            }
            other => {
                self.open = other;
                self.diagnostics.emit(
                    Diagnostic::warning(format!("end marker for `{name}` has no open region"))
                        .with_code(ErrorCode::E003)
                        .with_label(line.span(), "stray end marker")
                        .with_help("the marker is ignored"),
                );
            }
        }
    }

    fn push(&mut self, open: &OpenRegion<'a>, content_end: usize, end: usize, terminated: bool) {
        let content_range = open.content_start..content_end;
        let content = &self.text[content_range.clone()];
        log::trace!(name = open.name, start = open.start, end = end; "Region located");
        self.regions.push(ManagedRegion::new(
            open.name,
            open.start,
            end,
            content_range,
            content,
            terminated,
        ));
    }

    fn locate(mut self) -> Result<RegionMap, ParseError> {
        for line in lines::scan(self.text) {
            match parse_marker(&line) {
                Some((MarkerKind::Begin, name)) => self.begin(&line, name),
                Some((MarkerKind::End, name)) => self.end(&line, name),
                None => {}
            }
        }

        if let Some(open) = self.open.take() {
            self.diagnostics.emit(
                Diagnostic::warning(format!("region `{}` has no end marker", open.name))
                    .with_code(ErrorCode::E004)
                    .with_label(open.span, "region opened here")
                    .with_help("the region is treated as running to the end of the document"),
            );
            let len = self.text.len();
            self.push(&open, len, len, false);
        }

        let diagnostics = self.diagnostics.finish()?;
        Ok(RegionMap {
            regions: self.regions,
            diagnostics,
        })
    }
}

/// Locate every managed region in `text`.
///
/// # Errors
///
/// Returns a [`ParseError`] when the markers are ambiguous: a section name
/// used twice (E001) or a region opened inside another one (E002). The error
/// also carries any warnings found on the way.
pub fn locate_regions(text: &str) -> Result<RegionMap, ParseError> {
    Locator::new(text).locate()
}

/// Locate the region named `name`, if present.
///
/// # Errors
///
/// Same conditions as [`locate_regions`]; ambiguity anywhere in the document
/// is reported even if it involves other sections.
pub fn find_region(text: &str, name: &str) -> Result<Option<ManagedRegion>, ParseError> {
    let map = locate_regions(text)?;
    Ok(map.get(name).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;

    fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
        diagnostics.iter().filter_map(Diagnostic::code).collect()
    }

    #[test]
    fn test_marker_shapes() {
        let cases = [
            ("<!-- specgram:begin section=\"journey\" -->", Some((MarkerKind::Begin, "journey"))),
            ("  <!--specgram:end section=journey -->  ", Some((MarkerKind::End, "journey"))),
            ("<!-- specgram:begin section = \"entity-relationship\" -->", Some((MarkerKind::Begin, "entity-relationship"))),
            ("<!-- specgram:begin section=\"bad name\" -->", None),
            ("<!-- specgram:begin -->", None),
            ("text <!-- specgram:begin section=\"journey\" -->", None),
        ];

        for (text, expected) in cases {
            let mut input = text;
            assert_eq!(marker(&mut input).ok(), expected, "input: {text}");
        }
    }

    #[test]
    fn test_rendered_markers_parse_back() {
        let begin = begin_marker("journey");
        let end = end_marker("journey");

        assert_eq!(
            marker(&mut begin.as_str()).ok(),
            Some((MarkerKind::Begin, "journey"))
        );
        assert_eq!(
            marker(&mut end.as_str()).ok(),
            Some((MarkerKind::End, "journey"))
        );
    }

    #[test]
    fn test_locate_single_region() {
        let text = "# Doc\n<!-- specgram:begin section=\"journey\" -->\nold\n<!-- specgram:end section=\"journey\" -->\ntail\n";
        let map = locate_regions(text).expect("well-formed markers");

        assert_eq!(map.regions().len(), 1);
        let region = map.get("journey").expect("journey region");
        assert_eq!(region.start_offset(), 6);
        assert_eq!(&text[region.range()], &text[6..text.len() - 5]);
        assert_eq!(region.current_content(), "old\n");
        assert!(region.is_terminated());
        assert!(map.diagnostics().is_empty());
    }

    #[test]
    fn test_markers_inside_fence_are_recognised() {
        let text = "<!-- specgram:begin section=\"journey\" -->\n```mermaid\nflowchart TD\n<!-- specgram:end section=\"journey\" -->\nafter\n";
        let map = locate_regions(text).expect("well-formed markers");

        let region = map.get("journey").expect("journey region");
        assert!(region.is_terminated());
        assert!(region.current_content().starts_with("```mermaid"));
    }

    #[test]
    fn test_duplicate_region_is_fatal() {
        let text = "<!-- specgram:begin section=\"journey\" -->\n<!-- specgram:end section=\"journey\" -->\n\
                    <!-- specgram:begin section=\"journey\" -->\n<!-- specgram:end section=\"journey\" -->\n";
        let err = locate_regions(text).unwrap_err();

        assert_eq!(codes(err.diagnostics()), vec![ErrorCode::E001]);
        assert_eq!(err.diagnostics()[0].labels().len(), 2);
    }

    #[test]
    fn test_nested_region_is_fatal() {
        let text = "<!-- specgram:begin section=\"journey\" -->\n<!-- specgram:begin section=\"entity-relationship\" -->\n\
                    <!-- specgram:end section=\"entity-relationship\" -->\n<!-- specgram:end section=\"journey\" -->\n";
        let err = locate_regions(text).unwrap_err();

        assert!(codes(err.diagnostics()).contains(&ErrorCode::E002));
    }

    #[test]
    fn test_stray_end_marker_warns() {
        let text = "intro\n<!-- specgram:end section=\"journey\" -->\n";
        let map = locate_regions(text).expect("stray end markers are not fatal");

        assert!(map.regions().is_empty());
        assert_eq!(codes(map.diagnostics()), vec![ErrorCode::E003]);
        assert_eq!(map.diagnostics()[0].severity(), Severity::Warning);
    }

    #[test]
    fn test_unterminated_region_runs_to_end() {
        let text = "intro\n<!-- specgram:begin section=\"journey\" -->\nleft over\n";
        let map = locate_regions(text).expect("unterminated regions are not fatal");

        let region = map.get("journey").expect("journey region");
        assert!(!region.is_terminated());
        assert_eq!(region.end_offset(), text.len());
        assert_eq!(region.current_content(), "left over\n");
        assert_eq!(codes(map.diagnostics()), vec![ErrorCode::E004]);
    }

    #[test]
    fn test_find_region() {
        let text = "<!-- specgram:begin section=\"a\" -->\nx\n<!-- specgram:end section=\"a\" -->\n";

        assert!(find_region(text, "a").expect("valid").is_some());
        assert!(find_region(text, "b").expect("valid").is_none());
    }

    #[test]
    fn test_section_name_validation() {
        assert!(is_valid_section_name("entity-relationship"));
        assert!(is_valid_section_name("journey_2"));
        assert!(!is_valid_section_name(""));
        assert!(!is_valid_section_name("two words"));
    }
}
