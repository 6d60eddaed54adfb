//! Flat-file mentor store.
//!
//! Layout next to the configured data path (e.g. `mentors.csv`):
//! - `mentors.csv`:       header row + one row per mentor, insertion order
//! - `mentors.meta.json`: `StoreMeta`, the persisted id counter
//! - `mentors.lock`:      advisory lock file for cross-process writers
//!
//! Every append rewrites the whole CSV through a temp file + rename. That is
//! only acceptable while the pool stays small.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread::sleep;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{MentorStore, StoreError, HEADER};
use crate::models::mentor::{MentorRecord, NewMentor};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// Id counter persisted independently of the row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub next_mentor_id: u64,
    pub updated_at: DateTime<Utc>,
}

pub struct CsvMentorStore {
    path: PathBuf,
    meta_path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    /// Serializes writers inside this process; the lock file covers other processes.
    writer: Mutex<()>,
}

impl CsvMentorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        CsvMentorStore {
            meta_path: path.with_extension("meta.json"),
            lock_path: path.with_extension("lock"),
            path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            writer: Mutex::new(()),
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Runs `f` while holding both the in-process mutex and the exclusive file lock.
    fn with_write_lock<T>(
        &self,
        f: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        // Guards no data; a poisoned lock is still safe to reuse.
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.acquire_file_lock()?;
        f()
    }

    fn acquire_file_lock(&self) -> Result<FileLockGuard, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|source| StoreError::Io {
                path: self.lock_path.clone(),
                source,
            })?;

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLockGuard(file)),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::LockTimeout {
                            path: self.lock_path.clone(),
                        });
                    }
                    sleep(LOCK_RETRY_INTERVAL);
                }
                Err(source) => {
                    return Err(StoreError::Io {
                        path: self.lock_path.clone(),
                        source,
                    })
                }
            }
        }
    }

    /// `Ok(None)` only when the file does not exist. Anything else that goes
    /// wrong while reading is an error, never an empty pool.
    fn read_records(&self) -> Result<Option<Vec<MentorRecord>>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers().map_err(|e| self.malformed(e.to_string()))?;
        if !headers.iter().map(str::trim).eq(HEADER) {
            return Err(self.malformed(format!(
                "expected header '{}', found '{}'",
                HEADER.join(","),
                headers.iter().collect::<Vec<_>>().join(",")
            )));
        }

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        for (row, result) in reader.deserialize::<MentorRecord>().enumerate() {
            let record = result.map_err(|e| self.malformed(format!("row {}: {e}", row + 1)))?;
            if !seen.insert(record.mentor_id) {
                return Err(self.malformed(format!(
                    "row {}: duplicate mentor_id {}",
                    row + 1,
                    record.mentor_id
                )));
            }
            records.push(record);
        }

        Ok(Some(records))
    }

    fn write_records(&self, records: &[MentorRecord]) -> Result<(), StoreError> {
        let mut tmp = self.temp_file()?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            writer.write_record(HEADER)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush().map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        self.persist(tmp, &self.path)
    }

    fn read_meta(&self) -> Result<Option<StoreMeta>, StoreError> {
        let raw = match std::fs::read(&self.meta_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.meta_path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Meta {
                path: self.meta_path.clone(),
                source,
            })
    }

    fn write_meta(&self, meta: &StoreMeta) -> Result<(), StoreError> {
        let mut tmp = self.temp_file()?;
        let body = serde_json::to_vec_pretty(meta).map_err(|source| StoreError::Meta {
            path: self.meta_path.clone(),
            source,
        })?;
        tmp.write_all(&body).map_err(|source| StoreError::Io {
            path: self.meta_path.clone(),
            source,
        })?;
        self.persist(tmp, &self.meta_path)
    }

    fn temp_file(&self) -> Result<NamedTempFile, StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        NamedTempFile::new_in(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })
    }

    fn persist(&self, tmp: NamedTempFile, target: &Path) -> Result<(), StoreError> {
        tmp.as_file().sync_all().map_err(|source| StoreError::Io {
            path: target.to_path_buf(),
            source,
        })?;
        tmp.persist(target).map_err(|e| StoreError::Io {
            path: target.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }

    fn malformed(&self, reason: String) -> StoreError {
        StoreError::Malformed {
            path: self.path.clone(),
            reason,
        }
    }
}

impl MentorStore for CsvMentorStore {
    fn load(&self) -> Result<Vec<MentorRecord>, StoreError> {
        if let Some(records) = self.read_records()? {
            return Ok(records);
        }

        self.with_write_lock(|| {
            // Another writer may have created the file while we waited.
            if let Some(records) = self.read_records()? {
                return Ok(records);
            }
            self.write_records(&[])?;
            info!("Initialized empty mentor store at {}", self.path.display());
            Ok(Vec::new())
        })
    }

    fn append(&self, mentor: NewMentor) -> Result<MentorRecord, StoreError> {
        self.append_with(mentor, CsvMentorStore::write_records)
    }
}

impl CsvMentorStore {
    /// Claims the id in the counter file before the rows are replaced. A failed
    /// row write then costs one skipped id and never leaves a saved row behind
    /// an error.
    fn append_with(
        &self,
        mentor: NewMentor,
        write_rows: impl FnOnce(&Self, &[MentorRecord]) -> Result<(), StoreError>,
    ) -> Result<MentorRecord, StoreError> {
        self.with_write_lock(|| {
            let mut records = self.read_records()?.unwrap_or_default();
            let max_id = records.iter().map(|r| r.mentor_id).max().unwrap_or(0);
            let counter = self.read_meta()?.map(|meta| meta.next_mentor_id);
            let (mentor_id, following) = next_mentor_id(counter, max_id)
                .and_then(|id| id.checked_add(1).map(|following| (id, following)))
                .ok_or_else(|| self.malformed("mentor_id space exhausted".to_string()))?;

            self.write_meta(&StoreMeta {
                next_mentor_id: following,
                updated_at: Utc::now(),
            })?;

            let record = mentor.into_record(mentor_id);
            records.push(record.clone());
            write_rows(self, &records)?;

            debug!("Mentor store now holds {} rows", records.len());
            info!("Registered mentor {} ({})", record.mentor_id, record.name);
            Ok(record)
        })
    }
}

/// Picks the id for the next row: the persisted counter, raised past any id
/// already in the file. Without a counter, seeds from the highest existing id.
/// `None` once the id space is used up.
pub fn next_mentor_id(counter: Option<u64>, max_existing_id: u64) -> Option<u64> {
    let floor = max_existing_id.checked_add(1)?;
    match counter {
        Some(next) if next >= floor => Some(next),
        Some(next) => {
            warn!("Id counter {next} lags behind mentor_id {max_existing_id}; advancing to {floor}");
            Some(floor)
        }
        None => Some(floor),
    }
}

struct FileLockGuard(File);

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mentor::{LearningStyle, PrepLevel};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn new_mentor(name: &str) -> NewMentor {
        NewMentor {
            name: name.to_string(),
            preferred_subjects: "Legal Reasoning, GK".to_string(),
            target_colleges: "NLSIU, NALSAR".to_string(),
            prep_level: PrepLevel::Intermediate,
            learning_style: LearningStyle::ReadingWriting,
        }
    }

    fn ids(records: &[MentorRecord]) -> Vec<u64> {
        records.iter().map(|r| r.mentor_id).collect()
    }

    #[test]
    fn test_load_missing_file_creates_header_only_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        let store = CsvMentorStore::new(&path);

        assert!(store.load().unwrap().is_empty());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.trim_end(),
            "mentor_id,name,preferred_subjects,target_colleges,prep_level,learning_style"
        );
    }

    #[test]
    fn test_append_then_load_round_trips_fields_verbatim() {
        let dir = tempdir().unwrap();
        let store = CsvMentorStore::new(dir.path().join("mentors.csv"));

        let mentor = NewMentor {
            name: "Asha \"Ash\" Rao".to_string(),
            preferred_subjects: "Legal Reasoning, English".to_string(),
            target_colleges: " NLSIU,\nNALSAR ".to_string(),
            prep_level: PrepLevel::Advanced,
            learning_style: LearningStyle::Kinesthetic,
        };
        let created = store.append(mentor.clone()).unwrap();
        assert_eq!(created.mentor_id, 1);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![mentor.into_record(1)]);
    }

    #[test]
    fn test_load_preserves_insertion_order() {
        let dir = tempdir().unwrap();
        let store = CsvMentorStore::new(dir.path().join("mentors.csv"));
        for name in ["Zoya", "Arjun", "Meera"] {
            store.append(new_mentor(name)).unwrap();
        }

        let names: Vec<String> = store.load().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Zoya", "Arjun", "Meera"]);
    }

    #[test]
    fn test_ids_unique_across_reopen_cycles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        for round in 0..4 {
            let store = CsvMentorStore::new(&path);
            store.append(new_mentor(&format!("mentor-{round}"))).unwrap();
        }

        let loaded = CsvMentorStore::new(&path).load().unwrap();
        assert_eq!(ids(&loaded), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_removed_row_id_is_never_reused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        let store = CsvMentorStore::new(&path);
        for name in ["a", "b", "c"] {
            store.append(new_mentor(name)).unwrap();
        }

        // Drop mentor 2 by hand, the way an operator might edit the file.
        let mut records = store.load().unwrap();
        records.retain(|r| r.mentor_id != 2);
        store.write_records(&records).unwrap();

        let created = store.append(new_mentor("d")).unwrap();
        assert_eq!(created.mentor_id, 4);
        assert_eq!(ids(&store.load().unwrap()), vec![1, 3, 4]);
    }

    #[test]
    fn test_counter_seeded_from_existing_file_without_meta() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        std::fs::write(
            &path,
            "mentor_id,name,preferred_subjects,target_colleges,prep_level,learning_style\n\
             1,Ravi,GK,NALSAR,Beginner,Visual\n\
             7,Sana,Logical Reasoning,NLU Delhi,Advanced,Auditory\n",
        )
        .unwrap();

        let store = CsvMentorStore::new(&path);
        assert_eq!(store.append(new_mentor("new")).unwrap().mentor_id, 8);
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let dir = tempdir().unwrap();
        let store = Arc::new(CsvMentorStore::new(dir.path().join("mentors.csv")));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..5 {
                        store.append(new_mentor(&format!("t{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 40);
        let unique: HashSet<u64> = ids(&loaded).into_iter().collect();
        assert_eq!(unique.len(), 40);
    }

    #[test]
    fn test_separate_handles_on_same_file_are_serialized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        let first = Arc::new(CsvMentorStore::new(&path));
        let second = Arc::new(CsvMentorStore::new(&path));

        let handles: Vec<_> = [first, second]
            .into_iter()
            .enumerate()
            .map(|(n, store)| {
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store.append(new_mentor(&format!("h{n}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = CsvMentorStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 20);
        let unique: HashSet<u64> = ids(&loaded).into_iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_wrong_header_fails_loudly_and_keeps_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        std::fs::write(&path, "id,full_name\n1,Ravi\n").unwrap();

        let err = CsvMentorStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }), "got {err:?}");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "id,full_name\n1,Ravi\n"
        );
    }

    #[test]
    fn test_empty_existing_file_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        std::fs::write(&path, "").unwrap();

        let err = CsvMentorStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_unknown_prep_level_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        std::fs::write(
            &path,
            "mentor_id,name,preferred_subjects,target_colleges,prep_level,learning_style\n\
             1,Ravi,GK,NALSAR,Expert,Visual\n",
        )
        .unwrap();

        let err = CsvMentorStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("row 1"), "got {err}");
    }

    #[test]
    fn test_duplicate_ids_are_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        std::fs::write(
            &path,
            "mentor_id,name,preferred_subjects,target_colleges,prep_level,learning_style\n\
             2,Ravi,GK,NALSAR,Beginner,Visual\n\
             2,Sana,GK,NLSIU,Beginner,Visual\n",
        )
        .unwrap();

        let err = CsvMentorStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("duplicate mentor_id 2"), "got {err}");
    }

    #[test]
    fn test_corrupt_meta_fails_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        let store = CsvMentorStore::new(&path);
        store.append(new_mentor("a")).unwrap();
        std::fs::write(dir.path().join("mentors.meta.json"), "{not json").unwrap();

        let err = store.append(new_mentor("b")).unwrap_err();
        assert!(matches!(err, StoreError::Meta { .. }));
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_lock_timeout_when_lock_file_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        let holder = File::create(dir.path().join("mentors.lock")).unwrap();
        holder.lock_exclusive().unwrap();

        let store = CsvMentorStore::new(&path).with_lock_timeout(Duration::from_millis(50));
        let err = store.append(new_mentor("late")).unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout { .. }));

        FileExt::unlock(&holder).unwrap();
        assert_eq!(store.append(new_mentor("late")).unwrap().mentor_id, 1);
    }

    #[test]
    fn test_next_mentor_id_rules() {
        assert_eq!(next_mentor_id(None, 0), Some(1));
        assert_eq!(next_mentor_id(None, 5), Some(6));
        assert_eq!(next_mentor_id(Some(10), 3), Some(10));
        assert_eq!(next_mentor_id(Some(2), 3), Some(4));
        assert_eq!(next_mentor_id(None, u64::MAX), None);
        assert_eq!(next_mentor_id(Some(7), u64::MAX), None);
    }

    #[test]
    fn test_max_mentor_id_in_file_is_reported_and_store_recovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        std::fs::write(
            &path,
            format!(
                "mentor_id,name,preferred_subjects,target_colleges,prep_level,learning_style\n\
                 {},Ravi,GK,NALSAR,Beginner,Visual\n",
                u64::MAX
            ),
        )
        .unwrap();

        let store = CsvMentorStore::new(&path);
        assert_eq!(store.load().unwrap().len(), 1);
        let err = store.append(new_mentor("overflow")).unwrap_err();
        assert!(err.to_string().contains("mentor_id space exhausted"), "got {err}");

        std::fs::write(
            &path,
            "mentor_id,name,preferred_subjects,target_colleges,prep_level,learning_style\n\
             1,Ravi,GK,NALSAR,Beginner,Visual\n",
        )
        .unwrap();
        assert_eq!(store.append(new_mentor("after repair")).unwrap().mentor_id, 2);
    }

    #[test]
    fn test_max_counter_in_meta_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        let store = CsvMentorStore::new(&path);
        store
            .write_meta(&StoreMeta {
                next_mentor_id: u64::MAX,
                updated_at: Utc::now(),
            })
            .unwrap();

        let err = store.append(new_mentor("last")).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }), "got {err:?}");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_writer_panic_does_not_block_later_appends() {
        let dir = tempdir().unwrap();
        let store = CsvMentorStore::new(dir.path().join("mentors.csv"));

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = store.with_write_lock(|| -> Result<(), StoreError> {
                panic!("writer failed mid-append")
            });
        }));
        assert!(panicked.is_err());

        assert_eq!(store.append(new_mentor("next")).unwrap().mentor_id, 1);
    }

    #[test]
    fn test_failed_row_write_keeps_file_and_advances_counter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mentors.csv");
        let store = CsvMentorStore::new(&path);
        store.append(new_mentor("a")).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = store
            .append_with(new_mentor("b"), |store, _| {
                Err(StoreError::Io {
                    path: store.path.clone(),
                    source: std::io::Error::new(ErrorKind::Other, "disk full"),
                })
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.read_meta().unwrap().unwrap().next_mentor_id, 3);
        assert_eq!(store.append(new_mentor("c")).unwrap().mentor_id, 3);
        assert_eq!(ids(&store.load().unwrap()), vec![1, 3]);
    }
}
