//! Contact storage.
//!
//! The pipeline only talks to the [`ContactStore`] trait. Two adapters ship
//! with the crate:
//!
//! - [`MemoryStore`] - process-local, used by tests and `check` dry runs
//! - [`JsonFileStore`] - a single JSON document in a data directory
//!
//! The trait is synchronous; async callers wrap calls in
//! `tokio::task::spawn_blocking`. `insert_batch` must be all-or-nothing.

use chrono::Utc;
use fd_lock::RwLock as FileLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

use crate::error::{StorageError, StorageResult};
use crate::models::{Contact, NewContact, Owner};

/// Default page size for listings.
pub const DEFAULT_LIMIT: usize = 100;

/// Filter and paging for [`ContactStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactQuery {
    /// Restrict to this owner; `None` lists every owner's contacts.
    pub owner_id: Option<String>,
    /// Case-insensitive substring matched against organisation and description.
    pub search: Option<String>,
    pub skip: usize,
    /// `None` returns everything after `skip`.
    pub limit: Option<usize>,
}

impl ContactQuery {
    /// Everything `owner` may see: superusers see all contacts.
    pub fn visible_to(owner: &Owner) -> Self {
        Self {
            owner_id: (!owner.is_superuser).then(|| owner.id.clone()),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }

    pub fn with_page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }

    fn matches(&self, contact: &Contact) -> bool {
        if let Some(ref owner_id) = self.owner_id {
            if contact.owner_id != *owner_id {
                return false;
            }
        }

        match self.search {
            Some(ref search) => {
                let needle = search.trim().to_lowercase();
                contact.organisation.to_lowercase().contains(&needle)
                    || contact
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

/// One page of contacts, newest first, with the unpaged total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPage {
    pub data: Vec<Contact>,
    pub count: usize,
}

/// Storage collaborator for the import pipeline.
pub trait ContactStore: Send + Sync {
    /// Insert every contact or none of them.
    fn insert_batch(&self, owner: &Owner, batch: Vec<NewContact>) -> StorageResult<Vec<Contact>>;

    /// List contacts matching `query`, newest first.
    fn list(&self, query: &ContactQuery) -> StorageResult<ContactPage>;

    /// Insert a single contact.
    fn insert(&self, owner: &Owner, contact: NewContact) -> StorageResult<Contact> {
        self.insert_batch(owner, vec![contact])?
            .pop()
            .ok_or_else(|| StorageError::Rejected("insert returned no contact".into()))
    }
}

/// Filter, order (newest first) and page a slice of contacts.
pub fn apply_query(contacts: &[Contact], query: &ContactQuery) -> ContactPage {
    // Reverse first so that, within one batch timestamp, later rows come first
    let mut matching: Vec<&Contact> = contacts.iter().rev().filter(|c| query.matches(c)).collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let count = matching.len();
    let data = matching
        .into_iter()
        .skip(query.skip)
        .take(query.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    ContactPage { data, count }
}

fn materialize(owner: &Owner, batch: Vec<NewContact>) -> Vec<Contact> {
    let now = Utc::now();
    batch
        .into_iter()
        .map(|new| Contact::from_new(new, owner, now))
        .collect()
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store backed by a vector.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contacts: RwLock<Vec<Contact>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored contacts.
    pub fn len(&self) -> usize {
        self.contacts.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContactStore for MemoryStore {
    fn insert_batch(&self, owner: &Owner, batch: Vec<NewContact>) -> StorageResult<Vec<Contact>> {
        let created = materialize(owner, batch);
        let mut contacts = self.contacts.write().map_err(|_| StorageError::Poisoned)?;
        contacts.extend(created.iter().cloned());
        Ok(created)
    }

    fn list(&self, query: &ContactQuery) -> StorageResult<ContactPage> {
        let contacts = self.contacts.read().map_err(|_| StorageError::Poisoned)?;
        Ok(apply_query(&contacts, query))
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// File holding every contact, inside the data directory.
const CONTACTS_FILE: &str = "contacts.json";

/// Advisory lock serializing writers, inside the data directory.
const LOCK_FILE: &str = "contacts.lock";

/// Store persisting all contacts as one JSON document.
///
/// Writers take an exclusive lock on `contacts.lock`, so stores in other
/// threads or processes sharing the directory never interleave a
/// read-modify-write. Each write goes to its own synced temporary file
/// which is then renamed over the document: a batch is either fully on
/// disk or not at all.
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store in `data_dir`. The directory is created on first write.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the JSON document.
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(CONTACTS_FILE)
    }

    fn load(&self) -> StorageResult<Vec<Contact>> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn open_lock(&self) -> StorageResult<FileLock<File>> {
        fs::create_dir_all(&self.data_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.data_dir.join(LOCK_FILE))?;
        Ok(FileLock::new(file))
    }

    /// Caller must hold the writer lock.
    fn save(&self, contacts: &[Contact]) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(contacts)?;

        let mut tmp = NamedTempFile::new_in(&self.data_dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path()).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ContactStore for JsonFileStore {
    fn insert_batch(&self, owner: &Owner, batch: Vec<NewContact>) -> StorageResult<Vec<Contact>> {
        let mut lock = self.open_lock()?;
        let _guard = lock.write()?;

        let mut contacts = self.load()?;
        let created = materialize(owner, batch);
        contacts.extend(created.iter().cloned());
        self.save(&contacts)?;

        Ok(created)
    }

    fn list(&self, query: &ContactQuery) -> StorageResult<ContactPage> {
        let contacts = self.load()?;
        Ok(apply_query(&contacts, query))
    }
}
