//! Mentor Store: durable home of every registered mentor.
//!
//! Default: `CsvMentorStore` (flat CSV file plus an id counter sidecar).
//! `InMemoryMentorStore` carries the same contract without touching disk.
//!
//! `AppState` holds an `Arc<dyn MentorStore>`; handlers never see a file path.

pub mod csv_store;
pub mod in_memory;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::mentor::{MentorRecord, NewMentor};

pub use csv_store::CsvMentorStore;
pub use in_memory::InMemoryMentorStore;

/// Column order of the persisted table.
pub const HEADER: [&str; 6] = [
    "mentor_id",
    "name",
    "preferred_subjects",
    "target_colleges",
    "prep_level",
    "learning_style",
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed mentor data in {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Unreadable id counter in {}: {source}", path.display())]
    Meta {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Timed out waiting for the write lock on {}", path.display())]
    LockTimeout { path: PathBuf },

    #[error("Store lock poisoned: {0}")]
    Poisoned(String),
}

/// The store contract. Implementations must hand out ids that are never reused
/// and must serialize concurrent `append` calls.
pub trait MentorStore: Send + Sync {
    /// Every record in insertion order. A missing backing store is created empty.
    fn load(&self) -> Result<Vec<MentorRecord>, StoreError>;

    /// Persists one validated registration and returns it with its new id.
    fn append(&self, mentor: NewMentor) -> Result<MentorRecord, StoreError>;

    fn get(&self, mentor_id: u64) -> Result<Option<MentorRecord>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|m| m.mentor_id == mentor_id))
    }
}
