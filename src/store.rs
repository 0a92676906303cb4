//! File collection backing the listing endpoint.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::json;

use crate::{error::LoaderError, page::Record};

/// In-memory file collection.
///
/// Constructed once by its owner and shared by reference; there is no
/// implicit global instance.
#[derive(Debug, Default)]
pub struct FileStore {
    files: RwLock<Vec<Record>>,
}

impl FileStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `files` in insertion order
    #[must_use]
    pub fn with_records(files: Vec<Record>) -> Self {
        Self { files: RwLock::new(files) }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Record>>, LoaderError> {
        // Map to string because PoisonError holds the guard
        self.files.read().map_err(|e| LoaderError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Record>>, LoaderError> {
        self.files.write().map_err(|e| LoaderError::Poisoned(e.to_string()))
    }

    /// Number of documents
    pub fn count(&self) -> Result<usize, LoaderError> {
        Ok(self.read()?.len())
    }

    /// Up to `limit` documents after the first `skip`, with the count taken
    /// under the same lock
    pub fn find(&self, skip: usize, limit: usize) -> Result<(Vec<Record>, usize), LoaderError> {
        let files = self.read()?;
        let window = files.iter().skip(skip).take(limit).cloned().collect();
        Ok((window, files.len()))
    }

    /// Append a document
    pub fn insert(&self, record: Record) -> Result<(), LoaderError> {
        self.write()?.push(record);
        Ok(())
    }
}

const FILE_TYPES: [&str; 5] = ["pdf", "docx", "xlsx", "png", "txt"];
const USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const LOCATIONS: [&str; 3] = ["/shared", "/projects", "/archive"];

/// Sample file documents
#[must_use]
pub fn demo_files(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let kind = FILE_TYPES[i % FILE_TYPES.len()];
            let doc = json!({
                "_id": format!("{i:024x}"),
                "name": format!("file-{i:04}.{kind}"),
                "type": kind,
                "modified": format!("2024-{:02}-{:02}T{:02}:{:02}:00Z", i % 12 + 1, i % 28 + 1, i % 24, i % 60),
                "modifiedBy": USERS[i % USERS.len()],
                "fileSize": 1024 * (i % 512 + 1),
                "location": LOCATIONS[i % LOCATIONS.len()],
                "createdBy": USERS[(i + 1) % USERS.len()],
            });
            doc.as_object().cloned().unwrap_or_default()
        })
        .collect()
}
