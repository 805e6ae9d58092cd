//! Table of contents: heading extraction, nesting and active-heading
//! detection for the preview panel.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use ts_rs::TS;

static RE_NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: u8,
    /// 1-based source line of the heading.
    pub line: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct TocItem {
    pub id: String,
    pub text: String,
    pub level: u8,
    pub children: Vec<TocItem>,
}

/// Heading element geometry relative to the preview viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingBox {
    pub id: String,
    pub top: f64,
    pub bottom: f64,
}

pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = RE_NON_SLUG.replace_all(&lowered, "");
    let hyphenated = RE_WHITESPACE.replace_all(stripped.trim(), "-");
    let collapsed = RE_HYPHENS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Hands out unique heading ids in document order.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "heading".to_string();
        }
        let count = self.seen.entry(base.clone()).or_insert(0);
        let id = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        id
    }
}

fn heading_level_number(level: pulldown_cmark::HeadingLevel) -> u8 {
    level as u8
}

/// Headings in document order, skipping anything inside code blocks.
pub fn extract_headings(markdown: &str) -> Vec<Heading> {
    let line_starts = line_starts(markdown);
    let mut slugger = Slugger::new();
    let mut headings = Vec::new();
    let mut current: Option<(u8, usize, String)> = None;

    for (event, range) in Parser::new(markdown).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let line = line_at(&line_starts, range.start);
                current = Some((heading_level_number(level), line, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, buffer)) = current.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, line, text)) = current.take() {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        continue;
                    }
                    headings.push(Heading {
                        id: slugger.slug(&text),
                        text,
                        level,
                        line,
                    });
                }
            }
            _ => {}
        }
    }
    headings
}

/// Nest headings under the nearest preceding heading of a lower level.
pub fn build_hierarchy(headings: &[Heading]) -> Vec<TocItem> {
    let mut root: Vec<TocItem> = Vec::new();
    // Open ancestors, innermost last. Closed items are folded into their parent.
    let mut stack: Vec<TocItem> = Vec::new();

    for heading in headings {
        while stack.last().is_some_and(|open| open.level >= heading.level) {
            close_top(&mut stack, &mut root);
        }
        stack.push(TocItem {
            id: heading.id.clone(),
            text: heading.text.clone(),
            level: heading.level,
            children: Vec::new(),
        });
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut root);
    }
    root
}

fn close_top(stack: &mut Vec<TocItem>, root: &mut Vec<TocItem>) {
    if let Some(item) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(item),
            None => root.push(item),
        }
    }
}

/// The heading that is most visible in a viewport of `viewport_height`,
/// weighted toward the top of the viewport.
pub fn active_heading(boxes: &[HeadingBox], viewport_height: f64) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for heading in boxes {
        if heading.id.is_empty() || heading.bottom <= 0.0 || heading.top >= viewport_height {
            continue;
        }
        let visible = heading.bottom.min(viewport_height) - heading.top.max(0.0);
        let distance = heading.top.max(0.0);
        let score = visible / (1.0 + distance * 0.01);
        if score > best.map_or(0.0, |(_, top_score)| top_score) {
            best = Some((heading.id.as_str(), score));
        }
    }
    best.map(|(id, _)| id)
}

pub(crate) fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect()
}

/// 1-based line containing byte `offset`.
pub(crate) fn line_at(line_starts: &[usize], offset: usize) -> usize {
    line_starts.partition_point(|&start| start <= offset).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_strip_punctuation_and_collapse_hyphens() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  API -- v2  "), "api-v2");
        assert_eq!(slugify("Ünïcode wörds"), "ünïcode-wörds");
    }

    #[test]
    fn duplicate_headings_get_numbered_ids() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Setup"), "setup");
        assert_eq!(slugger.slug("Setup"), "setup-1");
        assert_eq!(slugger.slug("Setup"), "setup-2");
        assert_eq!(slugger.slug("!!!"), "heading");
    }

    #[test]
    fn headings_in_code_blocks_are_ignored() {
        let markdown = "# Title\n\n```sh\n# not a heading\n```\n\n## Usage `cli`\n";
        let headings = extract_headings(markdown);
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].line, 1);
        assert_eq!(headings[1].text, "Usage cli");
        assert_eq!(headings[1].id, "usage-cli");
        assert_eq!(headings[1].line, 7);
    }

    #[test]
    fn hierarchy_nests_by_level() {
        let markdown = "# A\n## B\n### C\n## D\n# E\n### F\n";
        let toc = build_hierarchy(&extract_headings(markdown));
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].id, "a");
        assert_eq!(toc[0].children.len(), 2);
        assert_eq!(toc[0].children[0].children[0].id, "c");
        assert_eq!(toc[0].children[1].id, "d");
        assert_eq!(toc[1].children[0].id, "f");
    }

    #[test]
    fn active_heading_prefers_visible_headings_near_the_top() {
        let boxes = vec![
            HeadingBox {
                id: "above".into(),
                top: -80.0,
                bottom: -40.0,
            },
            HeadingBox {
                id: "near-top".into(),
                top: 10.0,
                bottom: 40.0,
            },
            HeadingBox {
                id: "lower".into(),
                top: 300.0,
                bottom: 340.0,
            },
        ];
        assert_eq!(active_heading(&boxes, 600.0), Some("near-top"));
        assert_eq!(active_heading(&boxes[..1], 600.0), None);
    }
}
