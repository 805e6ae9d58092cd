//! Bidirectional scroll synchronization between the source editor and the
//! rendered preview.

mod map;
mod panel;
mod sync;

pub use map::{ScrollMap, ScrollMapEntry};
pub use panel::{EditorPanel, LineAnchor, PreviewPanel, ScrollPanel, StaticPanel};
pub use sync::{Panel, ScrollSynchronizer, SyncSettings, SyncState, SyncStatus};
