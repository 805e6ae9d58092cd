//! Markdown to HTML for the preview panel.
//!
//! Every top-level block is tagged with `data-source-line`, the 1-based line
//! it starts on, so the scroll map can anchor preview elements to editor
//! lines. Headings receive the same ids the table of contents hands out.

use crate::toc::{Slugger, line_at, line_starts};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

pub const SOURCE_LINE_ATTR: &str = "data-source-line";
const LINE_MARKER_OPEN: &str = "<!--markpad-line:";
// Ends in a newline so the writer does not prefix the block with one.
const LINE_MARKER_CLOSE: &str = "-->\n";

pub trait Renderer {
    fn render(&self, markdown: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        }
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> anyhow::Result<String> {
        let starts = line_starts(markdown);
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut depth = 0usize;

        for (event, range) in Parser::new_ext(markdown, self.options).into_offset_iter() {
            let tagged = !matches!(event, Event::Start(Tag::HtmlBlock) | Event::Html(_));
            if depth == 0 && tagged {
                let line = line_at(&starts, range.start);
                events.push(Event::Html(CowStr::from(format!(
                    "{LINE_MARKER_OPEN}{line}{LINE_MARKER_CLOSE}"
                ))));
            }
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
            events.push(event);
        }

        assign_heading_ids(&mut events, &mut Slugger::new());
        // One writer for the whole document keeps footnote numbering global.
        let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut rendered, events.into_iter());
        Ok(apply_line_markers(&rendered))
    }
}

/// Replace each block marker with a source-line attribute on the element
/// that follows it.
fn apply_line_markers(rendered: &str) -> String {
    let mut segments = rendered.split(LINE_MARKER_OPEN);
    let mut output = String::with_capacity(rendered.len());
    output.push_str(segments.next().unwrap_or_default());
    for segment in segments {
        let parsed = segment
            .split_once(LINE_MARKER_CLOSE)
            .and_then(|(line, rest)| Some((line.parse::<usize>().ok()?, rest)));
        match parsed {
            Some((line, rest)) => output.push_str(&tag_first_element(rest, line)),
            None => {
                output.push_str(LINE_MARKER_OPEN);
                output.push_str(segment);
            }
        }
    }
    output
}

fn assign_heading_ids(events: &mut [Event<'_>], slugger: &mut Slugger) {
    let mut open: Option<(usize, String)> = None;
    for idx in 0..events.len() {
        match &events[idx] {
            Event::Start(Tag::Heading { .. }) => open = Some((idx, String::new())),
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buffer)) = open.as_mut() {
                    buffer.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some((start, text)) = open.take() else {
                    continue;
                };
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                let slug = slugger.slug(text);
                if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
                    if id.is_none() {
                        *id = Some(CowStr::from(slug));
                    }
                }
            }
            _ => {}
        }
    }
}

/// Insert the source-line attribute into the first opening tag of `chunk`.
fn tag_first_element(chunk: &str, line: usize) -> String {
    let Some(rest) = chunk.strip_prefix('<') else {
        return chunk.to_string();
    };
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return chunk.to_string();
    }
    let name_end = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .map_or(chunk.len(), |idx| idx + 1);
    format!(
        "{} {SOURCE_LINE_ATTR}=\"{line}\"{}",
        &chunk[..name_end],
        &chunk[name_end..]
    )
}

/// Source-line tags found in rendered HTML, in document order.
pub fn source_lines(html: &str) -> Vec<usize> {
    let needle = format!("{SOURCE_LINE_ATTR}=\"");
    html.match_indices(&needle)
        .filter_map(|(idx, _)| {
            let rest = &html[idx + needle.len()..];
            rest.split('"').next()?.parse().ok()
        })
        .collect()
}
