//! InMemoryMentorStore - Vec-backed mentor store for tests and local development.

use std::sync::{Arc, RwLock};

use super::{MentorStore, StoreError};
use crate::models::mentor::{MentorRecord, NewMentor};

struct Pool {
    records: Vec<MentorRecord>,
    next_mentor_id: u64,
}

/// Clone-friendly via Arc. Ids follow the same never-reused counter rule as the CSV store.
#[derive(Clone)]
pub struct InMemoryMentorStore {
    pool: Arc<RwLock<Pool>>,
}

impl Default for InMemoryMentorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMentorStore {
    pub fn new() -> Self {
        Self {
            pool: Arc::new(RwLock::new(Pool {
                records: Vec::new(),
                next_mentor_id: 1,
            })),
        }
    }
}

impl MentorStore for InMemoryMentorStore {
    fn load(&self) -> Result<Vec<MentorRecord>, StoreError> {
        let pool = self
            .pool
            .read()
            .map_err(|_| StoreError::Poisoned("mentor pool".into()))?;
        Ok(pool.records.clone())
    }

    fn append(&self, mentor: NewMentor) -> Result<MentorRecord, StoreError> {
        let mut pool = self
            .pool
            .write()
            .map_err(|_| StoreError::Poisoned("mentor pool".into()))?;
        let record = mentor.into_record(pool.next_mentor_id);
        pool.next_mentor_id += 1;
        pool.records.push(record.clone());
        Ok(record)
    }
}
