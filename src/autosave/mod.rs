//! Adaptive autosave: edit classification, save scheduling, persistence and
//! startup recovery.

mod classifier;
mod gateway;
mod metadata;
mod recovery;
mod scheduler;
mod state;

pub use classifier::{Classification, ClassifierSettings, classify};
pub use gateway::{CONTENT_KEY, META_KEY, PersistenceGateway, SavedDocument, failure_message};
pub use metadata::{SaveMetadata, fingerprint, word_count};
pub use recovery::{RecoverableContent, find_recoverable};
pub use scheduler::{SaveScheduler, SaveSettings, UnloadDecision};
pub use state::{SaveState, SaveStats, SaveStatus, SaveStatusView};
