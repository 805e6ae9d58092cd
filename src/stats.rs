use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default, TS)]
#[ts(export)]
pub struct MarkdownStats {
    pub words: usize,
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub lines: usize,
    pub reading_time_minutes: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, TS)]
#[ts(export)]
pub struct SelectionStats {
    pub words: usize,
    pub characters: usize,
    /// Share of the document's characters that are selected, 0..=100.
    pub percentage: f64,
}

pub fn markdown_stats(content: &str, wpm: usize) -> MarkdownStats {
    let words = content.split_whitespace().count();
    let characters = content.chars().count();
    let characters_no_spaces = content.chars().filter(|c| !c.is_whitespace()).count();
    let lines = if content.is_empty() {
        0
    } else {
        content.split('\n').count()
    };
    MarkdownStats {
        words,
        characters,
        characters_no_spaces,
        lines,
        reading_time_minutes: reading_time_minutes(words, wpm),
    }
}

/// Whole minutes to read `words`, rounded up. At least one minute for any text.
pub fn reading_time_minutes(words: usize, wpm: usize) -> usize {
    if words == 0 {
        return 0;
    }
    words.div_ceil(wpm.max(1)).max(1)
}

pub fn selection_stats(selected: &str, document_chars: usize) -> SelectionStats {
    let characters = selected.chars().count();
    let percentage = if document_chars == 0 {
        0.0
    } else {
        (characters as f64 / document_chars as f64 * 100.0).min(100.0)
    };
    SelectionStats {
        words: selected.split_whitespace().count(),
        characters,
        percentage,
    }
}
