//! Cancellable timer primitives.
//!
//! Every delayed action in the editor (scroll quiescence, save debounce,
//! retry backoff, status display windows, periodic saves) is one of these
//! slots. A slot holds at most one deadline, so arming it again replaces the
//! previous deadline and a superseded timer can never fire late.

use crate::clock::Millis;

/// One-shot timer. `arm` restarts rather than extends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Millis>,
}

impl Timer {
    pub fn arm(&mut self, now: Millis, delay: Millis) {
        self.deadline = Some(now.saturating_add(delay));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    /// Consume the deadline if it has passed. Returns `true` exactly once per arm.
    pub fn fire(&mut self, now: Millis) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Periodic timer that can be paused and resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period: Millis,
    next: Option<Millis>,
    paused: bool,
}

impl Interval {
    pub fn new(period: Millis) -> Self {
        Self {
            period: period.max(1),
            next: None,
            paused: false,
        }
    }

    pub fn start(&mut self, now: Millis) {
        self.paused = false;
        self.next = Some(now.saturating_add(self.period));
    }

    pub fn pause(&mut self) {
        self.paused = true;
        self.next = None;
    }

    /// Resume a paused interval; the first tick lands one full period from `now`.
    pub fn resume(&mut self, now: Millis) {
        if self.paused {
            self.start(now);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.next
    }

    /// Returns `true` when a period boundary was crossed and schedules the next one.
    pub fn fire(&mut self, now: Millis) -> bool {
        match self.next {
            Some(next) if next <= now => {
                self.next = Some(now.saturating_add(self.period));
                true
            }
            _ => false,
        }
    }
}

/// Leading-edge throttle with a single trailing invocation.
///
/// A call outside the window runs immediately. Calls inside the window are
/// collapsed into one trailing run at the end of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    window: Millis,
    last_run: Option<Millis>,
    trailing: Timer,
}

impl Throttle {
    pub fn new(window: Millis) -> Self {
        Self {
            window,
            last_run: None,
            trailing: Timer::default(),
        }
    }

    /// Returns `true` if the caller should run now.
    pub fn attempt(&mut self, now: Millis) -> bool {
        match self.last_run {
            Some(last) if now.saturating_sub(last) < self.window => {
                let remaining = self.window - now.saturating_sub(last);
                if !self.trailing.is_armed() {
                    self.trailing.arm(now, remaining);
                }
                false
            }
            _ => {
                self.last_run = Some(now);
                self.trailing.cancel();
                true
            }
        }
    }

    /// Returns `true` once when a collapsed trailing call is due.
    pub fn fire_trailing(&mut self, now: Millis) -> bool {
        if self.trailing.fire(now) {
            self.last_run = Some(now);
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.trailing.cancel();
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.trailing.deadline()
    }
}

/// Earliest of several optional deadlines.
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Millis>>) -> Option<Millis> {
    deadlines.into_iter().flatten().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearm_replaces_previous_deadline() {
        let mut timer = Timer::default();
        timer.arm(0, 100);
        timer.arm(50, 100);
        assert!(!timer.fire(100), "old deadline must not fire after re-arm");
        assert!(timer.fire(150));
        assert!(!timer.fire(200), "timer fires once per arm");
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = Timer::default();
        timer.arm(0, 10);
        timer.cancel();
        assert!(!timer.fire(1_000));
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn interval_pauses_and_resumes_from_now() {
        let mut interval = Interval::new(30);
        interval.start(0);
        assert!(!interval.fire(29));
        assert!(interval.fire(30));
        interval.pause();
        assert!(!interval.fire(1_000));
        interval.resume(1_000);
        assert!(!interval.fire(1_020));
        assert!(interval.fire(1_030));
    }

    #[test]
    fn throttle_collapses_calls_into_trailing_run() {
        let mut throttle = Throttle::new(1_000);
        assert!(throttle.attempt(0));
        assert!(!throttle.attempt(200));
        assert!(!throttle.attempt(400));
        assert_eq!(throttle.deadline(), Some(1_000));
        assert!(!throttle.fire_trailing(999));
        assert!(throttle.fire_trailing(1_000));
        assert!(!throttle.fire_trailing(1_500));
        assert!(!throttle.attempt(1_500));
        assert!(throttle.attempt(2_000));
    }

    #[test]
    fn earliest_ignores_unarmed_slots() {
        assert_eq!(earliest([None, Some(40), Some(10), None]), Some(10));
        assert_eq!(earliest([None, None]), None);
    }
}
