//! Autosave scheduling.
//!
//! The scheduler turns edits and environment signals into at most one pending
//! save, performs saves through the [`PersistenceGateway`], and walks the
//! status indicator through `idle -> saving -> saved|error -> idle`. All
//! delayed work lives in [`Timer`] slots fired from [`SaveScheduler::tick`].

use super::classifier::{Classification, ClassifierSettings, classify};
use super::gateway::{PersistenceGateway, failure_message};
use super::metadata::{SaveMetadata, fingerprint};
use super::recovery::{RecoverableContent, find_recoverable};
use super::state::{SaveState, SaveStats, SaveStatus, SaveStatusView};
use crate::clock::{Millis, SECOND_MS};
use crate::config::EditorConfig;
use crate::storage::Storage;
use crate::timer::{Interval, Throttle, Timer, earliest};
use tracing::{debug, info, warn};

const OFFLINE_MESSAGE: &str = "Offline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSettings {
    pub classifier: ClassifierSettings,
    pub after_blur_delay_ms: Millis,
    pub saved_status_display_ms: Millis,
    pub error_status_display_ms: Millis,
    pub retry_delay_ms: Millis,
    pub throttle_save_ms: Millis,
    pub periodic_save_ms: Millis,
    pub recovery_window_days: u64,
}

impl From<&EditorConfig> for SaveSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            classifier: ClassifierSettings::from(config),
            after_blur_delay_ms: config.after_blur_delay_ms,
            saved_status_display_ms: config.saved_status_display_ms,
            error_status_display_ms: config.error_status_display_ms,
            retry_delay_ms: config.retry_delay_ms,
            throttle_save_ms: config.throttle_save_ms,
            periodic_save_ms: config.periodic_save_ms,
            recovery_window_days: config.recovery_window_days,
        }
    }
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

/// Outcome of a page-unload signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnloadDecision {
    /// Ask the user to confirm leaving; unsaved edits existed.
    pub confirm_discard: bool,
}

pub struct SaveScheduler<S> {
    gateway: PersistenceGateway<S>,
    settings: SaveSettings,
    state: SaveState,
    stats: SaveStats,
    metadata: Option<SaveMetadata>,
    last_save_time: Option<Millis>,
    online: bool,
    save_timer: Timer,
    retry_timer: Timer,
    status_timer: Timer,
    periodic: Interval,
    save_now: Throttle,
}

impl<S: Storage> SaveScheduler<S> {
    pub fn new(storage: S, settings: SaveSettings) -> Self {
        Self {
            gateway: PersistenceGateway::new(storage),
            state: SaveState::default(),
            stats: SaveStats::default(),
            metadata: None,
            last_save_time: None,
            online: true,
            save_timer: Timer::default(),
            retry_timer: Timer::default(),
            status_timer: Timer::default(),
            periodic: Interval::new(settings.periodic_save_ms),
            save_now: Throttle::new(settings.throttle_save_ms),
            settings,
        }
    }

    /// Pick up persisted metadata and start the periodic fallback save.
    pub fn start(&mut self, now: Millis) {
        self.state = SaveState::starting_at(now);
        self.load_metadata();
        if self.online {
            self.periodic.start(now);
        } else {
            self.periodic.pause();
        }
    }

    fn load_metadata(&mut self) {
        let saved = self.gateway.load();
        if let Some(metadata) = saved.metadata {
            self.last_save_time = Some(metadata.timestamp);
            if metadata.save_count > 0 {
                self.stats.total_saves = metadata.save_count;
            }
            self.metadata = Some(metadata);
        }
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    pub fn status(&self) -> SaveStatus {
        self.state.status
    }

    pub fn stats(&self) -> SaveStats {
        self.stats
    }

    pub fn metadata(&self) -> Option<&SaveMetadata> {
        self.metadata.as_ref()
    }

    pub fn last_save_time(&self) -> Option<Millis> {
        self.last_save_time
    }

    /// Whole seconds since the last successful save.
    pub fn last_save_ago(&self, now: Millis) -> Option<u64> {
        self.last_save_time
            .map(|saved_at| now.saturating_sub(saved_at) / SECOND_MS)
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut PersistenceGateway<S> {
        &mut self.gateway
    }

    /// Deadline of the pending debounced save, if any.
    pub fn pending_save(&self) -> Option<Millis> {
        self.save_timer.deadline()
    }

    pub fn pending_retry(&self) -> Option<Millis> {
        self.retry_timer.deadline()
    }

    pub fn has_unsaved_changes(&self, content: &str) -> bool {
        if content.is_empty() {
            return false;
        }
        match &self.metadata {
            None => true,
            Some(metadata) => fingerprint(content) != metadata.hash,
        }
    }

    pub fn status_view(&self, content: &str, now: Millis) -> SaveStatusView {
        SaveStatusView {
            status: self.state.status,
            error: self.state.error.clone(),
            has_unsaved_changes: self.has_unsaved_changes(content),
            is_typing_fast: self.state.is_typing_fast,
            last_save_ago_secs: self.last_save_ago(now),
            stats: self.stats,
        }
    }

    /// Replace any pending save with one `delay` ms from now.
    pub fn schedule_save(&mut self, delay: Millis, now: Millis) {
        self.save_timer.cancel();
        if self.state.status == SaveStatus::Saving {
            return;
        }
        self.save_timer.arm(now, delay);
        debug!(delay_ms = delay, "Scheduled save");
    }

    /// Save right away unless a save ran within the throttle window, in which
    /// case one trailing save runs when the window closes.
    pub fn save_now(&mut self, content: &str, now: Millis) -> bool {
        if self.save_now.attempt(now) {
            self.run_save_now(content, now)
        } else {
            debug!("Save request throttled");
            false
        }
    }

    fn run_save_now(&mut self, content: &str, now: Millis) -> bool {
        self.save_timer.cancel();
        if !content.is_empty() && self.has_unsaved_changes(content) {
            self.perform_save(content, now)
        } else {
            false
        }
    }

    pub fn perform_save(&mut self, content: &str, now: Millis) -> bool {
        self.perform(content, now, false)
    }

    fn perform(&mut self, content: &str, now: Millis, is_retry: bool) -> bool {
        if !self.gateway.is_available() {
            return false;
        }
        if !self.online {
            self.status_timer.cancel();
            self.retry_timer.cancel();
            self.state.status = SaveStatus::Error;
            self.state.error = Some(OFFLINE_MESSAGE.to_string());
            info!("Offline; deferring save until connectivity returns");
            return false;
        }

        // A new cycle supersedes any timer left over from the previous one.
        self.status_timer.cancel();
        self.retry_timer.cancel();
        self.state.status = SaveStatus::Saving;
        self.state.error = None;

        let result = if content.is_empty() {
            self.gateway.clear().map(|()| {
                self.metadata = None;
                self.last_save_time = None;
            })
        } else {
            let metadata =
                SaveMetadata::for_content(content, now, self.stats.total_saves.saturating_add(1));
            self.gateway.write(content, &metadata).map(|()| {
                self.last_save_time = Some(metadata.timestamp);
                self.stats.total_saves = self.stats.total_saves.saturating_add(1);
                self.stats.last_save_size = metadata.character_count;
                self.metadata = Some(metadata);
            })
        };

        match result {
            Ok(()) => {
                self.state.unsaved_change_size = 0;
                self.state.status = SaveStatus::Saved;
                self.status_timer
                    .arm(now, self.settings.saved_status_display_ms);
                info!(
                    chars = self.stats.last_save_size,
                    total_saves = self.stats.total_saves,
                    cleared = content.is_empty(),
                    is_retry,
                    "Saved document"
                );
                true
            }
            Err(err) => {
                let message = failure_message(&err);
                self.stats.failed_saves = self.stats.failed_saves.saturating_add(1);
                self.state.status = SaveStatus::Error;
                self.state.error = Some(message.to_string());
                self.status_timer
                    .arm(now, self.settings.error_status_display_ms);
                if !is_retry && !err.is_quota() {
                    self.retry_timer.arm(now, self.settings.retry_delay_ms);
                }
                warn!(
                    error = %err,
                    is_retry,
                    retry_armed = self.retry_timer.is_armed(),
                    "{message}"
                );
                false
            }
        }
    }

    /// Classify an edit and schedule the save it calls for.
    pub fn on_content_change(&mut self, old: &str, new: &str, now: Millis) -> Classification {
        let classification = classify(
            &self.settings.classifier,
            old.chars().count(),
            new.chars().count(),
            now,
            &mut self.state,
        );
        if classification.is_paste {
            debug!("Large change detected; saving immediately");
        }
        self.schedule_save(classification.delay, now);
        classification
    }

    pub fn on_focus_lost(&mut self, content: &str, now: Millis) {
        if self.has_unsaved_changes(content) {
            self.schedule_save(self.settings.after_blur_delay_ms, now);
        }
    }

    pub fn on_visibility_hidden(&mut self, content: &str, now: Millis) {
        if self.has_unsaved_changes(content) {
            self.save_now(content, now);
        }
    }

    /// Pointer left the page: best-effort synchronous save.
    pub fn on_page_leave(&mut self, content: &str, now: Millis) {
        if self.has_unsaved_changes(content) {
            self.perform_save(content, now);
        }
    }

    pub fn on_before_unload(&mut self, content: &str, now: Millis) -> UnloadDecision {
        let unsaved = self.has_unsaved_changes(content);
        if unsaved {
            self.perform_save(content, now);
        }
        UnloadDecision {
            confirm_discard: unsaved,
        }
    }

    pub fn set_online(&mut self, online: bool, content: &str, now: Millis) {
        if self.online == online {
            return;
        }
        self.online = online;
        if online {
            info!("Connectivity restored");
            let failed = self.state.status == SaveStatus::Error;
            if self.state.error.as_deref() == Some(OFFLINE_MESSAGE) {
                // The offline error has no display timer; reconnecting ends it.
                self.state.status = SaveStatus::Idle;
                self.state.error = None;
            }
            if failed && self.has_unsaved_changes(content) {
                self.save_now(content, now);
            }
            self.periodic.resume(now);
        } else {
            info!("Connectivity lost; pausing periodic saves");
            self.periodic.pause();
        }
    }

    /// Fire every due timer against the current `content`.
    pub fn tick(&mut self, content: &str, now: Millis) {
        if self.status_timer.fire(now)
            && matches!(self.state.status, SaveStatus::Saved | SaveStatus::Error)
        {
            self.state.status = SaveStatus::Idle;
        }
        if self.retry_timer.fire(now) {
            debug!("Retrying failed save");
            self.perform(content, now, true);
        }
        if self.save_timer.fire(now) && self.has_unsaved_changes(content) {
            self.perform_save(content, now);
        }
        if self.save_now.fire_trailing(now) {
            self.run_save_now(content, now);
        }
        if self.periodic.fire(now)
            && self.state.status == SaveStatus::Idle
            && self.has_unsaved_changes(content)
        {
            debug!("Periodic fallback save");
            self.perform_save(content, now);
        }
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        earliest([
            self.status_timer.deadline(),
            self.retry_timer.deadline(),
            self.save_timer.deadline(),
            self.save_now.deadline(),
            self.periodic.deadline(),
        ])
    }

    /// Forget everything persisted and return to a clean idle state.
    pub fn clear_saved_content(&mut self) {
        if let Err(err) = self.gateway.clear() {
            debug!("Failed to clear saved content: {err}");
        }
        self.save_timer.cancel();
        self.retry_timer.cancel();
        self.status_timer.cancel();
        self.save_now.cancel();
        self.metadata = None;
        self.last_save_time = None;
        self.state.status = SaveStatus::Idle;
        self.state.error = None;
        self.state.unsaved_change_size = 0;
    }

    /// Saved content worth offering for restore while the editor is blank.
    pub fn recoverable_content(
        &mut self,
        live_content: &str,
        now: Millis,
    ) -> Option<RecoverableContent> {
        if !self.gateway.is_available() {
            return None;
        }
        let saved = self.gateway.load();
        if let Some(metadata) = &saved.metadata {
            self.last_save_time = Some(metadata.timestamp);
            self.metadata = Some(metadata.clone());
        }
        let found = find_recoverable(
            saved,
            live_content,
            now,
            self.settings.recovery_window_days,
        );
        if let Some(found) = &found {
            info!(
                chars = found.metadata.character_count,
                saved_at = found.metadata.timestamp,
                "Recoverable content available"
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::gateway::{CONTENT_KEY, META_KEY};
    use crate::clock::DAY_MS;
    use crate::storage::MemoryStorage;

    const T0: Millis = 1_000_000;

    fn scheduler() -> SaveScheduler<MemoryStorage> {
        scheduler_with(MemoryStorage::new())
    }

    fn scheduler_with(storage: MemoryStorage) -> SaveScheduler<MemoryStorage> {
        let mut scheduler = SaveScheduler::new(storage, SaveSettings::default());
        scheduler.start(T0);
        scheduler
    }

    fn writes(scheduler: &SaveScheduler<MemoryStorage>) -> usize {
        scheduler.gateway().storage().writes()
    }

    #[test]
    fn unchanged_content_is_not_written_twice() {
        let mut scheduler = scheduler();
        assert!(scheduler.save_now("# Notes", T0));
        let after_first = writes(&scheduler);

        assert!(!scheduler.save_now("# Notes", T0 + 10));
        scheduler.tick("# Notes", T0 + 1_000);
        assert_eq!(writes(&scheduler), after_first);

        scheduler.schedule_save(0, T0 + 2_000);
        scheduler.tick("# Notes", T0 + 2_000);
        assert_eq!(writes(&scheduler), after_first);
        assert_eq!(scheduler.stats().total_saves, 1);
    }

    #[test]
    fn throttled_save_runs_once_at_window_end_with_latest_content() {
        let mut scheduler = scheduler();
        assert!(scheduler.save_now("a", T0));
        assert!(!scheduler.save_now("ab", T0 + 200));
        assert_eq!(scheduler.next_deadline(), Some(T0 + 1_000));
        scheduler.tick("abc", T0 + 1_000);
        assert_eq!(scheduler.stats().total_saves, 2);
        assert_eq!(
            scheduler.metadata().map(|meta| meta.character_count),
            Some(3)
        );
    }

    #[test]
    fn paste_schedules_an_immediate_save() {
        let mut scheduler = scheduler();
        let old = "x".repeat(50);
        let new = "x".repeat(200);
        let classification = scheduler.on_content_change(&old, &new, T0 + 100);
        assert!(classification.is_paste);
        assert_eq!(scheduler.pending_save(), Some(T0 + 100));

        scheduler.tick(&new, T0 + 100);
        assert_eq!(scheduler.status(), SaveStatus::Saved);
    }

    #[test]
    fn fast_typing_debounces_for_half_a_second() {
        let mut scheduler = scheduler();
        scheduler.on_content_change("", "a", T0 + 5_000);
        let second = scheduler.on_content_change("a", "ab", T0 + 5_100);
        assert!(second.is_typing_fast);
        assert_eq!(second.delay, 500);
        assert_eq!(scheduler.pending_save(), Some(T0 + 5_600));
    }

    #[test]
    fn rescheduling_supersedes_the_pending_save() {
        let mut scheduler = scheduler();
        scheduler.schedule_save(3_000, T0);
        scheduler.schedule_save(500, T0 + 100);
        scheduler.tick("draft", T0 + 600);
        assert_eq!(scheduler.stats().total_saves, 1);
        scheduler.tick("draft", T0 + 3_000);
        assert_eq!(scheduler.stats().total_saves, 1);
    }

    #[test]
    fn successful_save_resets_the_accumulator() {
        let mut scheduler = scheduler();
        scheduler.on_content_change("", "some words typed", T0 + 10_000);
        assert_eq!(scheduler.state().unsaved_change_size, 16);
        assert!(scheduler.perform_save("some words typed", T0 + 10_500));
        assert_eq!(scheduler.state().unsaved_change_size, 0);
        assert_eq!(scheduler.last_save_ago(T0 + 13_500), Some(3));
    }

    #[test]
    fn offline_save_fails_once_without_retry() {
        let mut scheduler = scheduler();
        scheduler.set_online(false, "", T0);
        assert!(!scheduler.perform_save("draft", T0 + 10));
        assert_eq!(scheduler.status(), SaveStatus::Error);
        assert_eq!(scheduler.state().error.as_deref(), Some("Offline"));
        assert_eq!(scheduler.pending_retry(), None);
        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(scheduler.stats().failed_saves, 0);

        scheduler.tick("draft", T0 + 60_000);
        assert_eq!(scheduler.status(), SaveStatus::Error);
        assert_eq!(writes(&scheduler), 0);
    }

    #[test]
    fn reconnect_retries_and_resumes_periodic_saves() {
        let mut scheduler = scheduler();
        scheduler.set_online(false, "", T0);
        scheduler.perform_save("draft", T0 + 10);

        scheduler.set_online(true, "draft", T0 + 5_000);
        assert_eq!(scheduler.status(), SaveStatus::Saved);
        assert_eq!(scheduler.stats().total_saves, 1);

        scheduler.tick("draft", T0 + 7_000);
        assert_eq!(scheduler.status(), SaveStatus::Idle);
        scheduler.tick("draft v2", T0 + 35_000);
        assert_eq!(scheduler.stats().total_saves, 2);
    }

    #[test]
    fn reconnect_with_nothing_to_save_clears_offline_error() {
        let mut scheduler = scheduler();
        assert!(scheduler.perform_save("# Saved", T0));
        let saved_writes = writes(&scheduler);
        scheduler.set_online(false, "# Saved", T0 + 100);
        scheduler.perform_save("# Saved and edited", T0 + 200);
        assert_eq!(scheduler.state().error.as_deref(), Some("Offline"));

        // The user reverts to the persisted text before the network returns.
        scheduler.set_online(true, "# Saved", T0 + 5_000);
        assert_eq!(scheduler.status(), SaveStatus::Idle);
        assert_eq!(scheduler.state().error, None);
        assert_eq!(writes(&scheduler), saved_writes);
    }

    #[test]
    fn empty_content_clears_persisted_state() {
        let mut scheduler = scheduler();
        assert!(scheduler.perform_save("# Keep me", T0));
        assert!(scheduler.perform_save("", T0 + 100));

        let storage = scheduler.gateway().storage();
        assert_eq!(storage.get(CONTENT_KEY).expect("get"), None);
        assert_eq!(storage.get(META_KEY).expect("get"), None);
        assert_eq!(scheduler.last_save_time(), None);
        assert_eq!(scheduler.status(), SaveStatus::Saved);
        assert!(!scheduler.has_unsaved_changes(""));
    }

    #[test]
    fn failed_save_retries_once_and_recovers() {
        let mut storage = MemoryStorage::new();
        storage.fail_next_writes(1);
        let mut scheduler = scheduler_with(storage);

        assert!(!scheduler.perform_save("draft", T0));
        assert_eq!(scheduler.status(), SaveStatus::Error);
        assert_eq!(scheduler.state().error.as_deref(), Some("Save failed"));
        assert_eq!(scheduler.pending_retry(), Some(T0 + 1_000));

        scheduler.tick("draft", T0 + 1_000);
        assert_eq!(scheduler.status(), SaveStatus::Saved);
        assert_eq!(scheduler.stats().failed_saves, 1);
        assert_eq!(scheduler.stats().total_saves, 1);

        // The saved banner clears on its own schedule; the error banner from
        // the failed attempt was superseded.
        scheduler.tick("draft", T0 + 3_000);
        assert_eq!(scheduler.status(), SaveStatus::Idle);
        assert_eq!(scheduler.next_deadline(), Some(T0 + 30_000));
    }

    #[test]
    fn retry_gives_up_after_one_attempt() {
        let mut storage = MemoryStorage::new();
        storage.fail_next_writes(2);
        let mut scheduler = scheduler_with(storage);

        scheduler.perform_save("draft", T0);
        scheduler.tick("draft", T0 + 1_000);
        assert_eq!(scheduler.status(), SaveStatus::Error);
        assert_eq!(scheduler.stats().failed_saves, 2);
        assert_eq!(scheduler.pending_retry(), None);

        scheduler.tick("draft", T0 + 6_000);
        assert_eq!(scheduler.status(), SaveStatus::Idle);
    }

    #[test]
    fn quota_failure_is_reported_and_not_retried() {
        let mut scheduler = scheduler_with(MemoryStorage::with_quota(64));
        let large = "x".repeat(200);
        assert!(!scheduler.perform_save(&large, T0));
        assert_eq!(scheduler.state().error.as_deref(), Some("Storage full"));
        assert_eq!(scheduler.pending_retry(), None);
    }

    #[test]
    fn unavailable_storage_is_a_silent_no_op() {
        let mut scheduler = scheduler_with(MemoryStorage::unavailable());
        assert!(!scheduler.perform_save("draft", T0));
        assert_eq!(scheduler.status(), SaveStatus::Idle);
        assert_eq!(scheduler.state().error, None);
        assert!(scheduler.recoverable_content("", T0).is_none());
    }

    #[test]
    fn unsaved_changes_follow_the_fingerprint() {
        let mut scheduler = scheduler();
        assert!(!scheduler.has_unsaved_changes(""));
        assert!(scheduler.has_unsaved_changes("new"));
        scheduler.perform_save("new", T0);
        assert!(!scheduler.has_unsaved_changes("new"));
        assert!(scheduler.has_unsaved_changes("newer"));
    }

    #[test]
    fn environment_signals_trigger_saves() {
        let mut scheduler = scheduler();
        scheduler.on_focus_lost("", T0);
        assert_eq!(scheduler.pending_save(), None);
        scheduler.on_focus_lost("draft", T0);
        assert_eq!(scheduler.pending_save(), Some(T0 + 100));

        scheduler.on_visibility_hidden("draft", T0 + 20);
        assert_eq!(scheduler.stats().total_saves, 1);
        assert_eq!(scheduler.pending_save(), None);

        let decision = scheduler.on_before_unload("draft", T0 + 5_000);
        assert!(!decision.confirm_discard);
        let decision = scheduler.on_before_unload("draft!", T0 + 5_000);
        assert!(decision.confirm_discard);
        assert!(!scheduler.has_unsaved_changes("draft!"));
    }

    #[test]
    fn restart_seeds_stats_and_offers_recovery() {
        let mut first = scheduler();
        first.perform_save("# Draft", T0);
        first.perform_save("# Draft 2", T0 + 10);
        let storage = first.gateway().storage().clone();

        let mut second = scheduler_with(storage);
        assert_eq!(second.stats().total_saves, 2);
        assert_eq!(second.last_save_time(), Some(T0 + 10));
        let found = second
            .recoverable_content("", T0 + DAY_MS)
            .expect("recent draft is offered");
        assert_eq!(found.content, "# Draft 2");
        assert!(second.recoverable_content("", T0 + 8 * DAY_MS).is_none());
    }

    #[test]
    fn clearing_resets_to_idle() {
        let mut scheduler = scheduler();
        scheduler.perform_save("draft", T0);
        scheduler.schedule_save(500, T0);
        scheduler.clear_saved_content();
        assert_eq!(scheduler.status(), SaveStatus::Idle);
        assert_eq!(scheduler.metadata(), None);
        assert_eq!(scheduler.pending_save(), None);
        assert!(scheduler.gateway().storage().is_empty());
    }
}
