//! Piecewise-linear correspondence between editor and preview scroll offsets.
//!
//! The map is anchored by elements in the preview that carry the source line
//! they were rendered from. The editor side of each anchor is computed from
//! the editor's fixed line height, so no editor layout queries are needed.

use super::panel::{EditorPanel, PreviewPanel};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollMapEntry {
    pub source_line: usize,
    pub editor_offset: f64,
    pub preview_offset: f64,
}

/// Sorted, monotonic in both offset columns, first entry at (0, 0) and last
/// entry at both panels' maximum scroll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollMap {
    entries: Vec<ScrollMapEntry>,
}

impl ScrollMap {
    /// Build from live panels. `None` when either panel is not mounted.
    pub fn build<E, P>(editor: Option<&E>, preview: Option<&P>) -> Option<Self>
    where
        E: EditorPanel + ?Sized,
        P: PreviewPanel + ?Sized,
    {
        let (editor, preview) = (editor?, preview?);
        let line_height = editor.line_height();
        let padding_top = editor.padding_top().max(0.0);

        let tagged = if line_height.is_finite() && line_height > 0.0 {
            preview
                .line_anchors()
                .into_iter()
                .filter(|anchor| anchor.top.is_finite())
                .map(|anchor| ScrollMapEntry {
                    source_line: anchor.source_line,
                    editor_offset: padding_top
                        + anchor.source_line.saturating_sub(1) as f64 * line_height,
                    preview_offset: anchor.top,
                })
                .collect()
        } else {
            Vec::new()
        };

        let map = Self::from_entries(editor.max_scroll(), preview.max_scroll(), tagged);
        debug!(
            entries = map.entries.len(),
            editor_max = editor.max_scroll(),
            preview_max = preview.max_scroll(),
            "Rebuilt scroll map"
        );
        Some(map)
    }

    /// Normalize raw tagged entries into a valid map.
    ///
    /// Offsets are clamped into each panel's range, entries are sorted by
    /// editor offset (ties by source line), an entry whose preview offset
    /// falls below the previous kept entry is dropped, and among entries
    /// sharing an editor offset the last one wins. The synthetic start entry
    /// is pinned; the synthetic terminal entry replaces anything at the
    /// editor's maximum.
    pub fn from_entries(
        editor_max: f64,
        preview_max: f64,
        mut tagged: Vec<ScrollMapEntry>,
    ) -> Self {
        let editor_max = sanitize_extent(editor_max);
        let preview_max = sanitize_extent(preview_max);
        let last_line = tagged.iter().map(|entry| entry.source_line).max().unwrap_or(0);

        for entry in &mut tagged {
            entry.editor_offset = entry.editor_offset.clamp(0.0, editor_max);
            entry.preview_offset = entry.preview_offset.clamp(0.0, preview_max);
        }
        tagged.sort_by(|a, b| {
            a.editor_offset
                .total_cmp(&b.editor_offset)
                .then(a.source_line.cmp(&b.source_line))
        });

        let start = ScrollMapEntry {
            source_line: 0,
            editor_offset: 0.0,
            preview_offset: 0.0,
        };
        let mut entries = vec![start];
        for entry in tagged {
            let Some(last) = entries.last().copied() else {
                continue;
            };
            if entry.preview_offset < last.preview_offset {
                continue;
            }
            if entry.editor_offset == last.editor_offset {
                if entries.len() > 1 {
                    if let Some(slot) = entries.last_mut() {
                        *slot = entry;
                    }
                }
                continue;
            }
            entries.push(entry);
        }

        let terminal = ScrollMapEntry {
            source_line: last_line.saturating_add(1),
            editor_offset: editor_max,
            preview_offset: preview_max,
        };
        let replace_last = entries.len() > 1
            && entries
                .last()
                .is_some_and(|last| last.editor_offset >= editor_max);
        match entries.last_mut() {
            Some(last) if replace_last => *last = terminal,
            _ => entries.push(terminal),
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[ScrollMapEntry] {
        &self.entries
    }

    /// Number of anchors besides the two synthetic endpoints.
    pub fn anchor_count(&self) -> usize {
        self.entries.len().saturating_sub(2)
    }

    pub fn editor_to_preview(&self, editor_top: f64) -> f64 {
        interpolate(
            &self.entries,
            editor_top,
            |entry| entry.editor_offset,
            |entry| entry.preview_offset,
        )
    }

    pub fn preview_to_editor(&self, preview_top: f64) -> f64 {
        interpolate(
            &self.entries,
            preview_top,
            |entry| entry.preview_offset,
            |entry| entry.editor_offset,
        )
    }
}

fn sanitize_extent(extent: f64) -> f64 {
    if extent.is_finite() { extent.max(0.0) } else { 0.0 }
}

fn interpolate(
    entries: &[ScrollMapEntry],
    value: f64,
    key: impl Fn(&ScrollMapEntry) -> f64,
    target: impl Fn(&ScrollMapEntry) -> f64,
) -> f64 {
    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        return 0.0;
    };
    if !value.is_finite() || value <= key(first) {
        return target(first);
    }
    if value >= key(last) {
        return target(last);
    }

    let upper = entries.partition_point(|entry| key(entry) <= value);
    let lower = &entries[upper - 1];
    let upper = &entries[upper];
    let span = key(upper) - key(lower);
    if span <= f64::EPSILON {
        return target(lower);
    }
    let ratio = (value - key(lower)) / span;
    target(lower) + ratio * (target(upper) - target(lower))
}
