use super::map::ScrollMap;
use super::panel::{EditorPanel, PreviewPanel, ScrollPanel};
use crate::clock::Millis;
use crate::config::EditorConfig;
use crate::timer::{Timer, earliest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Panel {
    Editor,
    Preview,
}

impl Panel {
    pub fn other(self) -> Panel {
        match self {
            Panel::Editor => Panel::Preview,
            Panel::Preview => Panel::Editor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SyncStatus {
    Disabled,
    Syncing,
    Enabled,
}

/// Gesture bookkeeping. At most one panel is active; the other panel's
/// scroll events are ignored while it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    pub active_panel: Option<Panel>,
    pub is_mouse_down: bool,
    pub pending_editor: bool,
    pub pending_preview: bool,
}

impl SyncState {
    fn pending_mut(&mut self, panel: Panel) -> &mut bool {
        match panel {
            Panel::Editor => &mut self.pending_editor,
            Panel::Preview => &mut self.pending_preview,
        }
    }

    fn clear_pending(&mut self) {
        self.pending_editor = false;
        self.pending_preview = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSettings {
    pub quiescence_ms: Millis,
    pub pointer_quiescence_ms: Millis,
    pub jitter_threshold_px: f64,
    pub scroll_to_element_ms: Millis,
}

impl From<&EditorConfig> for SyncSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            quiescence_ms: config.quiescence_ms,
            pointer_quiescence_ms: config.pointer_quiescence_ms,
            jitter_threshold_px: config.jitter_threshold_px.max(0.0),
            scroll_to_element_ms: config.scroll_to_element_ms,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

/// Eased programmatic scroll from one offset to another.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollAnimation {
    from: f64,
    to: f64,
    started_at: Millis,
    duration: Millis,
}

impl ScrollAnimation {
    fn position(&self, now: Millis) -> (f64, bool) {
        if self.duration == 0 {
            return (self.to, true);
        }
        let elapsed = now.saturating_sub(self.started_at) as f64;
        let t = (elapsed / self.duration as f64).clamp(0.0, 1.0);
        // Ease-out cubic, like a browser smooth scroll settling in.
        let eased = 1.0 - (1.0 - t).powi(3);
        (self.from + (self.to - self.from) * eased, t >= 1.0)
    }
}

/// Keeps the editor and preview panels aligned while either is scrolled.
///
/// Event handlers only record intent; offsets are written to the opposite
/// panel from `on_animation_frame`, so a burst of scroll events costs at most
/// one write per frame per panel. `tick` drives the quiescence and
/// programmatic-scroll timers.
pub struct ScrollSynchronizer<E, P> {
    editor: Option<E>,
    preview: Option<P>,
    settings: SyncSettings,
    enabled: bool,
    state: SyncState,
    map: Option<ScrollMap>,
    map_stale: bool,
    quiescence: Timer,
    programmatic: Timer,
    editor_animation: Option<ScrollAnimation>,
    preview_animation: Option<ScrollAnimation>,
    last_scroll_source: Option<Panel>,
    last_scroll_percentage: f64,
}

impl<E: EditorPanel, P: PreviewPanel> ScrollSynchronizer<E, P> {
    pub fn new(settings: SyncSettings, enabled: bool) -> Self {
        Self {
            editor: None,
            preview: None,
            settings,
            enabled,
            state: SyncState::default(),
            map: None,
            map_stale: true,
            quiescence: Timer::default(),
            programmatic: Timer::default(),
            editor_animation: None,
            preview_animation: None,
            last_scroll_source: None,
            last_scroll_percentage: 0.0,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(SyncSettings::from(config), config.sync_enabled)
    }

    pub fn set_editor_element(&mut self, editor: Option<E>) {
        self.editor = editor;
        self.editor_animation = None;
        self.map_stale = true;
    }

    pub fn set_preview_element(&mut self, preview: Option<P>) {
        self.preview = preview;
        self.preview_animation = None;
        self.map_stale = true;
    }

    pub fn editor(&self) -> Option<&E> {
        self.editor.as_ref()
    }

    pub fn preview(&self) -> Option<&P> {
        self.preview.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut E> {
        self.editor.as_mut()
    }

    pub fn preview_mut(&mut self) -> Option<&mut P> {
        self.preview.as_mut()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn status(&self) -> SyncStatus {
        if !self.enabled {
            SyncStatus::Disabled
        } else if self.state.active_panel.is_some() {
            SyncStatus::Syncing
        } else {
            SyncStatus::Enabled
        }
    }

    pub fn last_scroll_percentage(&self) -> f64 {
        self.last_scroll_percentage
    }

    pub fn scroll_map(&self) -> Option<&ScrollMap> {
        self.map.as_ref()
    }

    pub fn is_map_stale(&self) -> bool {
        self.map_stale
    }

    /// True while a scroll-to-element animation owns both panels.
    pub fn is_programmatic(&self) -> bool {
        self.programmatic.is_armed()
    }

    pub fn on_editor_scroll(&mut self, now: Millis) {
        self.handle_scroll(Panel::Editor, now);
    }

    pub fn on_preview_scroll(&mut self, now: Millis) {
        self.handle_scroll(Panel::Preview, now);
    }

    pub fn on_pointer_down(&mut self) {
        self.state.is_mouse_down = true;
    }

    pub fn on_pointer_up(&mut self) {
        self.state.is_mouse_down = false;
    }

    fn handle_scroll(&mut self, panel: Panel, now: Millis) {
        if !self.enabled || self.editor.is_none() || self.preview.is_none() {
            return;
        }
        if self.programmatic.is_armed() {
            trace!(?panel, "Ignoring scroll during programmatic navigation");
            return;
        }
        if self.state.active_panel == Some(panel.other()) {
            trace!(?panel, "Ignoring scroll echoed from synchronized panel");
            return;
        }

        self.state.active_panel = Some(panel);
        self.last_scroll_source = Some(panel);
        let quiet = if self.state.is_mouse_down {
            self.settings.pointer_quiescence_ms
        } else {
            self.settings.quiescence_ms
        };
        self.quiescence.arm(now, quiet);
        *self.state.pending_mut(panel) = true;
    }

    /// Apply pending translations and advance animations. Returns the number
    /// of panel writes performed.
    pub fn on_animation_frame(&mut self, now: Millis) -> usize {
        let mut writes = self.advance_animations(now);
        if !self.enabled {
            self.state.clear_pending();
            return writes;
        }
        for source in [Panel::Editor, Panel::Preview] {
            let pending = self.state.pending_mut(source);
            if !*pending {
                continue;
            }
            *pending = false;
            if self.translate_from(source) {
                writes += 1;
            }
        }
        writes
    }

    pub fn needs_frame(&self) -> bool {
        self.state.pending_editor
            || self.state.pending_preview
            || self.editor_animation.is_some()
            || self.preview_animation.is_some()
    }

    /// Fire due timers: quiescence returns the synchronizer to idle and the
    /// programmatic lock releases after the navigation window.
    pub fn tick(&mut self, now: Millis) {
        if self.programmatic.fire(now) {
            self.finish_animations();
            self.state.active_panel = None;
            debug!("Released programmatic scroll lock");
        }
        if self.quiescence.fire(now) && !self.programmatic.is_armed() {
            trace!(panel = ?self.state.active_panel, "Scroll gesture settled");
            self.state.active_panel = None;
        }
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        earliest([self.quiescence.deadline(), self.programmatic.deadline()])
    }

    pub fn toggle_sync(&mut self, now: Millis) -> bool {
        self.enabled = !self.enabled;
        // Navigation in flight belongs to the old mode; drop it with its lock.
        self.reset_gesture();
        info!(enabled = self.enabled, "Toggled scroll sync");

        if self.enabled {
            // Realign the follower to wherever the user left the leader.
            if let Some(source) = self.last_scroll_source {
                if self.editor.is_some() && self.preview.is_some() {
                    self.state.active_panel = Some(source);
                    self.quiescence.arm(now, self.settings.quiescence_ms);
                    *self.state.pending_mut(source) = true;
                }
            }
        }
        self.enabled
    }

    pub fn sync_to_top(&mut self) {
        self.reset_gesture();
        if let Some(editor) = self.editor.as_mut() {
            editor.set_scroll_top(0.0);
        }
        if let Some(preview) = self.preview.as_mut() {
            preview.set_scroll_top(0.0);
        }
        self.last_scroll_percentage = 0.0;
    }

    pub fn sync_to_bottom(&mut self) {
        self.reset_gesture();
        if let Some(editor) = self.editor.as_mut() {
            let max = editor.max_scroll();
            editor.set_scroll_top(max);
        }
        if let Some(preview) = self.preview.as_mut() {
            let max = preview.max_scroll();
            preview.set_scroll_top(max);
        }
        self.last_scroll_percentage = 100.0;
    }

    /// Navigate both panels to the preview element `id` (table of contents).
    ///
    /// The preview is held active for the whole animation window, so the
    /// scroll events produced by the animation are never synchronized back.
    pub fn scroll_to_element(&mut self, id: &str, now: Millis) -> bool {
        self.ensure_map();
        let (Some(editor), Some(preview), Some(map)) =
            (self.editor.as_ref(), self.preview.as_ref(), self.map.as_ref())
        else {
            return false;
        };
        let Some(top) = preview.element_top(id) else {
            debug!(%id, "Navigation target not found in preview");
            return false;
        };

        let preview_target = top.clamp(0.0, preview.max_scroll());
        let editor_target = map
            .preview_to_editor(preview_target)
            .clamp(0.0, editor.max_scroll());
        let duration = self.settings.scroll_to_element_ms;
        self.preview_animation = Some(ScrollAnimation {
            from: preview.scroll_top(),
            to: preview_target,
            started_at: now,
            duration,
        });
        self.editor_animation = Some(ScrollAnimation {
            from: editor.scroll_top(),
            to: editor_target,
            started_at: now,
            duration,
        });

        self.quiescence.cancel();
        self.state.clear_pending();
        self.state.active_panel = Some(Panel::Preview);
        self.last_scroll_source = Some(Panel::Preview);
        self.programmatic.arm(now, duration);
        debug!(%id, preview_target, editor_target, "Scrolling to element");
        true
    }

    /// Rebuild the scroll map from current panel layout.
    pub fn refresh_scroll_map(&mut self) {
        self.map = ScrollMap::build(self.editor.as_ref(), self.preview.as_ref());
        self.map_stale = self.map.is_none();
    }

    /// Mark the map stale; it is rebuilt lazily by the next translation.
    pub fn invalidate_scroll_map(&mut self) {
        self.map_stale = true;
    }

    /// Content was re-rendered: drop the map and realign the follower panel
    /// from the last panel the user scrolled.
    pub fn on_content_rendered(&mut self, now: Millis) {
        self.invalidate_scroll_map();
        if !self.enabled || self.programmatic.is_armed() {
            return;
        }
        if let Some(source) = self.last_scroll_source {
            if self.state.active_panel.is_none_or(|active| active == source) {
                self.state.active_panel = Some(source);
                self.quiescence.arm(now, self.settings.quiescence_ms);
                *self.state.pending_mut(source) = true;
            }
        }
    }

    fn ensure_map(&mut self) {
        if self.map_stale || self.map.is_none() {
            self.refresh_scroll_map();
        }
    }

    fn translate_from(&mut self, source: Panel) -> bool {
        self.ensure_map();
        let (Some(editor), Some(preview), Some(map)) =
            (self.editor.as_mut(), self.preview.as_mut(), self.map.as_ref())
        else {
            return false;
        };
        let threshold = self.settings.jitter_threshold_px;

        let (percentage, wrote) = match source {
            Panel::Editor => {
                let target = map.editor_to_preview(editor.scroll_top());
                (
                    editor.scroll_percentage(),
                    write_if_moved(preview, target, threshold),
                )
            }
            Panel::Preview => {
                let target = map.preview_to_editor(preview.scroll_top());
                (
                    preview.scroll_percentage(),
                    write_if_moved(editor, target, threshold),
                )
            }
        };
        self.last_scroll_percentage = percentage;
        trace!(?source, percentage, wrote, "Translated scroll position");
        wrote
    }

    fn advance_animations(&mut self, now: Millis) -> usize {
        let mut writes = 0;
        if let (Some(animation), Some(editor)) = (self.editor_animation, self.editor.as_mut()) {
            let (position, done) = animation.position(now);
            editor.set_scroll_top(position);
            writes += 1;
            if done {
                self.editor_animation = None;
            }
        }
        if let (Some(animation), Some(preview)) = (self.preview_animation, self.preview.as_mut()) {
            let (position, done) = animation.position(now);
            preview.set_scroll_top(position);
            writes += 1;
            if done {
                self.preview_animation = None;
            }
        }
        writes
    }

    fn finish_animations(&mut self) {
        if let (Some(animation), Some(editor)) = (self.editor_animation.take(), self.editor.as_mut())
        {
            editor.set_scroll_top(animation.to);
        }
        if let (Some(animation), Some(preview)) =
            (self.preview_animation.take(), self.preview.as_mut())
        {
            preview.set_scroll_top(animation.to);
        }
    }

    fn reset_gesture(&mut self) {
        self.quiescence.cancel();
        self.programmatic.cancel();
        self.editor_animation = None;
        self.preview_animation = None;
        self.state.clear_pending();
        self.state.active_panel = None;
    }
}

fn write_if_moved<T: ScrollPanel + ?Sized>(panel: &mut T, target: f64, threshold: f64) -> bool {
    if (panel.scroll_top() - target).abs() > threshold {
        panel.set_scroll_top(target);
        true
    } else {
        false
    }
}
