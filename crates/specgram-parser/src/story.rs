//! Story extractor.
//!
//! Recognises story headers such as
//!
//! ```text
//! ### User Story 1 - Browse the catalog (Priority: P1) 🎯 MVP
//! ```
//!
//! and the numbered acceptance scenarios beneath them:
//!
//! ```text
//! 1. **Given** a visitor on the home page, **When** they open the catalog, **Then** the product list is shown
//! ```

use winnow::{
    Parser as _,
    ascii::{Caseless, digit1, space0, space1},
    combinator::{alt, opt},
    error::ModalResult,
    token::{one_of, rest, take_until},
};

use specgram_core::story::{Priority, ScenarioRecord, StoryRecord};

use crate::{
    Extraction,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    lines::{self, Heading, Line},
};

type IResult<O> = ModalResult<O>;

/// `User Story <N> <sep>` up to the title.
fn header_prefix(input: &mut &str) -> IResult<u32> {
    (Caseless("user"), space1, Caseless("story"), space1).parse_next(input)?;
    let number = digit1.try_map(str::parse::<u32>).parse_next(input)?;
    (space0, alt(("-", "–", "—", ":")), space0).parse_next(input)?;
    Ok(number)
}

/// `(Priority: P<k>)` followed by anything.
fn priority_tag(input: &mut &str) -> IResult<Priority> {
    (
        '(',
        space0,
        Caseless("priority"),
        space0,
        ':',
        space0,
        Caseless("p"),
    )
        .parse_next(input)?;
    let level = one_of('1'..='4').parse_next(input)?;
    (space0, ')', rest).parse_next(input)?;

    let priority = match level {
        '1' => Priority::P1,
        '2' => Priority::P2,
        '3' => Priority::P3,
        _ => Priority::P4,
    };
    Ok(priority)
}

/// A parsed story header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoryHeader<'a> {
    number: u32,
    title: &'a str,
    priority: Priority,
}

/// Parse the text of a heading as a story header.
///
/// The title runs up to the last `(Priority:` tag so titles may contain
/// parentheses of their own.
fn story_header(text: &str) -> Option<StoryHeader<'_>> {
    let mut input = text;
    let number = header_prefix(&mut input).ok()?;

    let tag_start = input.to_ascii_lowercase().rfind("(priority")?;
    let title = input[..tag_start].trim();
    if title.is_empty() {
        return None;
    }

    let mut tag = &input[tag_start..];
    let priority = priority_tag(&mut tag).ok()?;
    Some(StoryHeader {
        number,
        title,
        priority,
    })
}

fn looks_like_story_header(text: &str) -> bool {
    text.get(..10)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("user story"))
}

/// `1.` or `1)` list-item prefix.
fn numbered_item<'a>(input: &mut &'a str) -> IResult<&'a str> {
    (space0, digit1, alt(('.', ')')), space1, rest)
        .map(|(_, _, _, _, body): (&str, &str, char, &str, &'a str)| body)
        .parse_next(input)
}

/// `Given <pre>, When <trigger>, Then <outcome>`; the commas are optional.
fn scenario_clauses<'a>(input: &mut &'a str) -> IResult<(&'a str, &'a str, &'a str)> {
    ("Given", space1).parse_next(input)?;
    let precondition = take_until(1.., " When ").parse_next(input)?;
    " When ".parse_next(input)?;
    let trigger = take_until(1.., " Then ").parse_next(input)?;
    " Then ".parse_next(input)?;
    let outcome = rest.parse_next(input)?;
    Ok((precondition, trigger, outcome))
}

fn clean_clause(clause: &str) -> &str {
    clause.trim().trim_end_matches(',').trim()
}

/// Strip `**` and `__` emphasis markers.
fn strip_strong_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "")
}

/// Outcome of reading one numbered list item.
#[derive(Debug, PartialEq, Eq)]
enum ScenarioLine {
    Scenario(ScenarioRecord),
    Malformed,
    Unrelated,
}

fn mentions_clause_keyword(body: &str) -> bool {
    body.split(|c: char| !c.is_alphanumeric())
        .any(|word| ["given", "when", "then"].iter().any(|k| word.eq_ignore_ascii_case(k)))
}

fn read_scenario(line: &str) -> ScenarioLine {
    let cleaned = strip_strong_emphasis(line);
    let mut input = cleaned.as_str();
    let Ok(body) = numbered_item(&mut input) else {
        return ScenarioLine::Unrelated;
    };

    let mut clauses = body.trim_end();
    match opt(scenario_clauses).parse_next(&mut clauses) {
        Ok(Some((pre, trigger, outcome))) => {
            let (pre, trigger, outcome) =
                (clean_clause(pre), clean_clause(trigger), clean_clause(outcome));
            if pre.is_empty() || trigger.is_empty() || outcome.is_empty() {
                ScenarioLine::Malformed
            } else {
                ScenarioLine::Scenario(ScenarioRecord::new(pre, trigger, outcome))
            }
        }
        _ if mentions_clause_keyword(body) => ScenarioLine::Malformed,
        _ => ScenarioLine::Unrelated,
    }
}

/// A story being assembled while its section is scanned.
struct OpenStory {
    record: StoryRecord,
    level: usize,
}

/// Extractor state for one pass over the document.
struct StoryExtractor {
    stories: Vec<StoryRecord>,
    current: Option<OpenStory>,
    last_number: Option<u32>,
    diagnostics: DiagnosticCollector,
}

impl StoryExtractor {
    fn new() -> Self {
        Self {
            stories: Vec::new(),
            current: None,
            last_number: None,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn close_current(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        let story = open.record;
        if !story.is_diagrammable() {
            self.diagnostics.emit(
                Diagnostic::warning(format!(
                    "user story {} has no acceptance scenarios",
                    story.sequence_number()
                ))
                .with_code(ErrorCode::E102)
                .with_label(story.span().into(), "story header")
                .with_help("the story is drawn as a single title node"),
            );
        }
        self.stories.push(story);
    }

    fn heading(&mut self, line: &Line<'_>, heading: Heading<'_>) {
        if let Some(header) = story_header(heading.text) {
            self.close_current();
            if self.last_number.is_some_and(|last| header.number <= last) {
                self.diagnostics.emit(
                    Diagnostic::warning(format!(
                        "user story {} is out of sequence",
                        header.number
                    ))
                    .with_code(ErrorCode::E103)
                    .with_label(line.span(), "story header")
                    .with_help("story numbers are kept as written"),
                );
            }
            self.last_number = Some(header.number);
            log::debug!(number = header.number, title = header.title; "Story header found");
            self.current = Some(OpenStory {
                record: StoryRecord::new(header.number, header.title, header.priority)
                    .with_span(line.span().range()),
                level: heading.level,
            });
            return;
        }

        if looks_like_story_header(heading.text) {
            self.close_current();
            self.diagnostics.emit(
                Diagnostic::warning("malformed user story header")
                    .with_code(ErrorCode::E100)
                    .with_label(line.span(), "skipped")
                    .with_help("expected `User Story <N> - <Title> (Priority: P<1-4>)`"),
            );
            return;
        }

        if self
            .current
            .as_ref()
            .is_some_and(|open| heading.level <= open.level)
        {
            self.close_current();
        }
    }

    fn body_line(&mut self, line: &Line<'_>) {
        let Some(open) = self.current.as_mut() else {
            return;
        };
        match read_scenario(line.text) {
            ScenarioLine::Scenario(scenario) => open.record.push_scenario(scenario),
            ScenarioLine::Malformed => {
                let number = open.record.sequence_number();
                self.diagnostics.emit(
                    Diagnostic::warning(format!(
                        "malformed acceptance scenario in user story {number}"
                    ))
                    .with_code(ErrorCode::E101)
                    .with_label(line.span(), "skipped")
                    .with_help("expected `<n>. Given <context>, When <action>, Then <outcome>`"),
                );
            }
            ScenarioLine::Unrelated => {}
        }
    }

    fn extract(mut self, text: &str) -> Extraction<StoryRecord> {
        for line in lines::scan(text) {
            if line.in_fence {
                continue;
            }
            match lines::heading(&line) {
                Some(heading) => self.heading(&line, heading),
                None => self.body_line(&line),
            }
        }
        self.close_current();

        log::debug!(stories = self.stories.len(); "Story extraction finished");
        Extraction::new(self.stories, self.diagnostics.into_diagnostics())
    }
}

/// Extract user stories and their acceptance scenarios.
///
/// Never fails: malformed headers and scenarios are skipped and reported as
/// warnings. A document without stories yields an empty extraction.
pub fn extract_stories(text: &str) -> Extraction<StoryRecord> {
    StoryExtractor::new().extract(text)
}
