//! Core of a markdown editor with a synchronized live preview and adaptive
//! autosave.
//!
//! Every stateful component is a deterministic state machine driven by the
//! host: event handlers take the current time in epoch milliseconds, and
//! `tick`/`on_animation_frame` fire due timers and coalesced scroll writes.

pub mod autosave;
pub mod clock;
pub mod config;
pub mod render;
pub mod scroll;
pub mod session;
pub mod share;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod toc;
