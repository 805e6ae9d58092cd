//! Editor session: the application-state object that owns the document and
//! wires edits, scrolling, rendering and autosave together.

use crate::autosave::{RecoverableContent, SaveScheduler, SaveSettings, SaveStatusView};
use crate::clock::Millis;
use crate::config::EditorConfig;
use crate::render::Renderer;
use crate::scroll::{EditorPanel, PreviewPanel, ScrollSynchronizer, StaticPanel, SyncStatus};
use crate::stats::{MarkdownStats, markdown_stats};
use crate::storage::Storage;
use crate::timer::{Timer, earliest};
use crate::toc::{TocItem, build_hierarchy, extract_headings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub save: SaveStatusView,
    pub sync: SyncStatus,
    pub scroll_percentage: f64,
    pub stats: MarkdownStats,
    pub toc: Vec<TocItem>,
    pub recovery_available: bool,
    pub render_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum SessionCommand {
    GetSnapshot,
    Edit { content: String },
    EditorScroll { top: f64 },
    PreviewScroll { top: f64 },
    PointerDown,
    PointerUp,
    FocusLost,
    VisibilityHidden,
    PageLeave,
    Unload,
    SetOnline { online: bool },
    ToggleSync,
    SyncToTop,
    SyncToBottom,
    NavigateToHeading { id: String },
    SaveNow,
    ClearSaved,
    RestoreRecovery,
    DismissRecovery,
    Tick,
    AnimationFrame,
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "editor_get_snapshot",
            Self::Edit { .. } => "editor_edit",
            Self::EditorScroll { .. } => "editor_scroll",
            Self::PreviewScroll { .. } => "preview_scroll",
            Self::PointerDown => "pointer_down",
            Self::PointerUp => "pointer_up",
            Self::FocusLost => "window_focus_lost",
            Self::VisibilityHidden => "document_hidden",
            Self::PageLeave => "page_leave",
            Self::Unload => "page_unload",
            Self::SetOnline { .. } => "network_status",
            Self::ToggleSync => "sync_toggle",
            Self::SyncToTop => "sync_to_top",
            Self::SyncToBottom => "sync_to_bottom",
            Self::NavigateToHeading { .. } => "toc_navigate",
            Self::SaveNow => "save_now",
            Self::ClearSaved => "save_clear",
            Self::RestoreRecovery => "recovery_restore",
            Self::DismissRecovery => "recovery_dismiss",
            Self::Tick => "timer_tick",
            Self::AnimationFrame => "animation_frame",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub action: &'static str,
    /// Set by `Unload`: the host should ask before discarding the page.
    pub confirm_discard: bool,
    pub snapshot: SessionSnapshot,
}

pub struct EditorSession<S, E = StaticPanel, P = StaticPanel> {
    config: EditorConfig,
    content: String,
    html: String,
    render_error: Option<String>,
    renderer: Box<dyn Renderer>,
    render_timer: Timer,
    autosave: SaveScheduler<S>,
    sync: ScrollSynchronizer<E, P>,
    recoverable: Option<RecoverableContent>,
}

impl<S: Storage, E: EditorPanel, P: PreviewPanel> EditorSession<S, E, P> {
    /// Start a session with a blank document, checking storage for content
    /// worth recovering.
    pub fn new(config: EditorConfig, storage: S, renderer: Box<dyn Renderer>, now: Millis) -> Self {
        let mut autosave = SaveScheduler::new(storage, SaveSettings::from(&config));
        autosave.start(now);
        let recoverable = autosave.recoverable_content("", now);
        let sync = ScrollSynchronizer::from_config(&config);
        Self {
            config,
            content: String::new(),
            html: String::new(),
            render_error: None,
            renderer,
            render_timer: Timer::default(),
            autosave,
            sync,
            recoverable,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn autosave(&self) -> &SaveScheduler<S> {
        &self.autosave
    }

    pub fn synchronizer(&self) -> &ScrollSynchronizer<E, P> {
        &self.sync
    }

    pub fn synchronizer_mut(&mut self) -> &mut ScrollSynchronizer<E, P> {
        &mut self.sync
    }

    pub fn recoverable(&self) -> Option<&RecoverableContent> {
        self.recoverable.as_ref()
    }

    pub fn snapshot(&self, now: Millis) -> SessionSnapshot {
        SessionSnapshot {
            save: self.autosave.status_view(&self.content, now),
            sync: self.sync.status(),
            scroll_percentage: self.sync.last_scroll_percentage(),
            stats: markdown_stats(&self.content, self.config.reading_wpm),
            toc: build_hierarchy(&extract_headings(&self.content)),
            recovery_available: self.recoverable.is_some(),
            render_error: self.render_error.clone(),
        }
    }

    pub fn apply(&mut self, command: SessionCommand, now: Millis) -> SessionEvent {
        let action = command.action();
        let mut confirm_discard = false;
        match command {
            SessionCommand::GetSnapshot => {}
            SessionCommand::Edit { content } => self.edit(content, now),
            SessionCommand::EditorScroll { top } => {
                if let Some(editor) = self.sync.editor_mut() {
                    editor.set_scroll_top(top);
                }
                self.sync.on_editor_scroll(now);
            }
            SessionCommand::PreviewScroll { top } => {
                if let Some(preview) = self.sync.preview_mut() {
                    preview.set_scroll_top(top);
                }
                self.sync.on_preview_scroll(now);
            }
            SessionCommand::PointerDown => self.sync.on_pointer_down(),
            SessionCommand::PointerUp => self.sync.on_pointer_up(),
            SessionCommand::FocusLost => self.autosave.on_focus_lost(&self.content, now),
            SessionCommand::VisibilityHidden => {
                self.autosave.on_visibility_hidden(&self.content, now)
            }
            SessionCommand::PageLeave => self.autosave.on_page_leave(&self.content, now),
            SessionCommand::Unload => {
                confirm_discard = self
                    .autosave
                    .on_before_unload(&self.content, now)
                    .confirm_discard;
            }
            SessionCommand::SetOnline { online } => {
                self.autosave.set_online(online, &self.content, now)
            }
            SessionCommand::ToggleSync => {
                self.sync.toggle_sync(now);
            }
            SessionCommand::SyncToTop => self.sync.sync_to_top(),
            SessionCommand::SyncToBottom => self.sync.sync_to_bottom(),
            SessionCommand::NavigateToHeading { id } => {
                self.navigate_to_heading(&id, now);
            }
            SessionCommand::SaveNow => {
                self.autosave.save_now(&self.content, now);
            }
            SessionCommand::ClearSaved => self.autosave.clear_saved_content(),
            SessionCommand::RestoreRecovery => self.restore_recovery(now),
            SessionCommand::DismissRecovery => self.recoverable = None,
            SessionCommand::Tick => self.tick(now),
            SessionCommand::AnimationFrame => {
                self.sync.on_animation_frame(now);
            }
        }
        SessionEvent {
            action,
            confirm_discard,
            snapshot: self.snapshot(now),
        }
    }

    /// Replace the document text.
    pub fn edit(&mut self, content: String, now: Millis) {
        if content == self.content {
            return;
        }
        let old = std::mem::replace(&mut self.content, content);
        self.autosave.on_content_change(&old, &self.content, now);
        self.sync.invalidate_scroll_map();
        self.render_timer.arm(now, self.config.render_debounce_ms);
        // Any edit answers the recovery prompt.
        self.recoverable = None;
    }

    pub fn navigate_to_heading(&mut self, id: &str, now: Millis) -> bool {
        self.sync.scroll_to_element(id, now)
    }

    fn restore_recovery(&mut self, now: Millis) {
        let Some(recovered) = self.recoverable.take() else {
            return;
        };
        info!(
            chars = recovered.metadata.character_count,
            "Restoring recovered content"
        );
        self.edit(recovered.content, now);
        self.render_now(now);
    }

    /// Render immediately, skipping the debounce.
    pub fn render_now(&mut self, now: Millis) {
        self.render_timer.cancel();
        match self.renderer.render(&self.content) {
            Ok(html) => {
                self.html = html;
                self.render_error = None;
                self.sync.on_content_rendered(now);
                debug!(bytes = self.html.len(), "Rendered preview");
            }
            Err(err) => {
                warn!("Preview render failed; keeping previous output: {err:#}");
                self.render_error = Some(err.to_string());
            }
        }
    }

    pub fn tick(&mut self, now: Millis) {
        if self.render_timer.fire(now) {
            self.render_now(now);
        }
        self.autosave.tick(&self.content, now);
        self.sync.tick(now);
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        earliest([
            self.render_timer.deadline(),
            self.autosave.next_deadline(),
            self.sync.next_deadline(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::SaveStatus;
    use crate::render::MarkdownRenderer;
    use crate::scroll::{LineAnchor, ScrollPanel};
    use crate::storage::MemoryStorage;

    const T0: Millis = 5_000_000;

    struct BrokenRenderer;

    impl Renderer for BrokenRenderer {
        fn render(&self, _markdown: &str) -> anyhow::Result<String> {
            anyhow::bail!("renderer crashed")
        }
    }

    fn session_with(storage: MemoryStorage) -> EditorSession<MemoryStorage> {
        EditorSession::new(
            EditorConfig::default(),
            storage,
            Box::new(MarkdownRenderer::new()),
            T0,
        )
    }

    fn session() -> EditorSession<MemoryStorage> {
        session_with(MemoryStorage::new())
    }

    #[test]
    fn edits_render_after_the_debounce() {
        let mut session = session();
        session.apply(
            SessionCommand::Edit {
                content: "# Hello\n".into(),
            },
            T0,
        );
        assert_eq!(session.html(), "");
        assert_eq!(session.next_deadline(), Some(T0 + 300));

        session.apply(SessionCommand::Tick, T0 + 300);
        assert!(session.html().contains("id=\"hello\""));
        assert!(session.synchronizer().is_map_stale());
    }

    #[test]
    fn typed_document_is_saved_and_summarized() {
        let mut session = session();
        session.edit("# Plan\n\n## Steps\n\nwrite the thing".into(), T0 + 10_000);
        let event = session.apply(SessionCommand::Tick, T0 + 13_000);
        assert_eq!(event.action, "timer_tick");
        assert_eq!(event.snapshot.save.status, SaveStatus::Saved);
        assert!(!event.snapshot.save.has_unsaved_changes);
        assert_eq!(event.snapshot.stats.words, 7);
        assert_eq!(event.snapshot.toc.len(), 1);
        assert_eq!(event.snapshot.toc[0].children[0].id, "steps");
    }

    #[test]
    fn render_failure_keeps_previous_html() {
        let mut session: EditorSession<MemoryStorage> = EditorSession::new(
            EditorConfig::default(),
            MemoryStorage::new(),
            Box::new(BrokenRenderer),
            T0,
        );
        session.edit("text".into(), T0);
        session.render_now(T0);
        assert_eq!(session.html(), "");
        assert_eq!(
            session.snapshot(T0).render_error.as_deref(),
            Some("renderer crashed")
        );
    }

    #[test]
    fn unload_asks_for_confirmation_only_with_unsaved_edits() {
        let mut session = session();
        assert!(!session.apply(SessionCommand::Unload, T0).confirm_discard);
        session.edit("draft".into(), T0 + 10);
        let event = session.apply(SessionCommand::Unload, T0 + 20);
        assert!(event.confirm_discard);
        assert_eq!(event.snapshot.save.status, SaveStatus::Saved);
    }

    #[test]
    fn recovery_is_offered_and_restored_on_request() {
        let mut first = session();
        first.edit("# Lost draft".into(), T0);
        first.apply(SessionCommand::SaveNow, T0 + 1);
        let storage = first.autosave().gateway().storage().clone();

        let mut second = session_with(storage);
        assert!(second.snapshot(T0 + 60_000).recovery_available);
        assert_eq!(second.content(), "", "recovery never auto-loads");

        second.apply(SessionCommand::RestoreRecovery, T0 + 60_000);
        assert_eq!(second.content(), "# Lost draft");
        assert!(second.html().contains("Lost draft"));
        assert!(second.recoverable().is_none());
    }

    #[test]
    fn heading_navigation_scrolls_both_panels() {
        let mut session = session();
        session.edit("# Intro\n\ntext\n\n# Setup\n".into(), T0);
        session.render_now(T0);
        let sync = session.synchronizer_mut();
        sync.set_editor_element(Some(
            StaticPanel::new(1_400.0, 400.0).with_line_metrics(20.0, 0.0),
        ));
        sync.set_preview_element(Some(
            StaticPanel::new(2_400.0, 400.0)
                .with_anchors(vec![LineAnchor {
                    source_line: 5,
                    top: 800.0,
                }])
                .with_element("setup", 800.0),
        ));

        let event = session.apply(
            SessionCommand::NavigateToHeading { id: "setup".into() },
            T0 + 500,
        );
        assert_eq!(event.snapshot.sync, SyncStatus::Syncing);
        session.apply(SessionCommand::AnimationFrame, T0 + 1_300);
        session.apply(SessionCommand::Tick, T0 + 1_300);

        let sync = session.synchronizer();
        assert_eq!(sync.preview().map(ScrollPanel::scroll_top), Some(800.0));
        assert_eq!(sync.editor().map(ScrollPanel::scroll_top), Some(80.0));
        assert_eq!(sync.status(), SyncStatus::Enabled);
    }

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let command: SessionCommand =
            serde_json::from_str(r#"{"type":"set_online","online":false}"#).expect("parse");
        assert_eq!(command, SessionCommand::SetOnline { online: false });
        assert_eq!(command.action(), "network_status");
    }
}
