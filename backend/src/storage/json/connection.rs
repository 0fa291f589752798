//! # JSON Connection
//!
//! The store handle. Owns the data directory and provides [`Batch`], the
//! unit in which every read-modify-write cycle runs.
//!
//! ## Blob Layout
//!
//! ```text
//! {data_directory}/
//! ├── profiles.json        [Profile, ...]
//! ├── consumptions.json    [Consumption, ...]
//! ├── results.json         [CalculationResult, ...]
//! └── current_profile      plain profile id
//! ```
//!
//! ## Guarantees
//!
//! - Operations on one handle (and its clones) are serialised by a mutex.
//! - A batch stages every blob it changes to `*.tmp` files before renaming
//!   any of them, so a failure while staging leaves all blobs untouched.
//!   Only the staging phase is all-or-nothing: if a rename fails, the blobs
//!   renamed before it stay replaced, and the temp files not yet renamed
//!   are removed.
//! - A blob that cannot be parsed is moved aside to
//!   `{blob}.corrupt-{epoch_millis}`, logged, and read as empty.
//!
//! Two handles opened on the same directory do not share the mutex, and
//! nothing guards against another process. Their read-modify-write cycles
//! can interleave and lose updates.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::config;

pub const CURRENT_PROFILE_FILE: &str = "current_profile";

/// The three record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Profiles,
    Consumptions,
    Results,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Profiles, Collection::Consumptions, Collection::Results];

    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Profiles => "profiles.json",
            Collection::Consumptions => "consumptions.json",
            Collection::Results => "results.json",
        }
    }
}

/// Handle to an on-device store rooted at one directory
#[derive(Debug, Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonConnection {
    /// Open a store in `base_directory`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {}", base_path.display()))?;
        }

        info!("Opened store at {}", base_path.display());
        Ok(Self {
            base_directory: base_path,
            lock: Arc::new(Mutex::new(())),
        })
    }

    /// Open the store in the per-user data directory
    pub fn open_default() -> Result<Self> {
        Self::open(config::default_data_directory()?)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.base_directory.join(collection.file_name())
    }

    pub fn current_profile_path(&self) -> PathBuf {
        self.base_directory.join(CURRENT_PROFILE_FILE)
    }

    /// Run `operation` under this handle's lock and commit what it staged.
    ///
    /// If `operation` fails nothing is written.
    pub fn transaction<R>(&self, operation: impl FnOnce(&mut Batch<'_>) -> Result<R>) -> Result<R> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Store lock poisoned for {}", self.base_directory.display()))?;

        let mut batch = Batch {
            connection: self,
            pending: Vec::new(),
        };
        let value = operation(&mut batch)?;
        batch.commit()?;
        Ok(value)
    }

    pub fn read_collection<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        self.transaction(|batch| batch.read(collection))
    }

    /// Remove all four blobs
    pub fn clear_all_data(&self) -> Result<()> {
        self.transaction(|batch| {
            batch.clear();
            Ok(())
        })?;
        info!("Cleared all data in {}", self.base_directory.display());
        Ok(())
    }

    /// Opaque id: base-36 epoch millis followed by 16 random hex digits
    pub fn generate_id() -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let random = Uuid::new_v4().simple().to_string();
        format!("{}{}", to_base36(millis), &random[..16])
    }

    fn recover_corrupt_blob(&self, path: &Path, reason: &str) {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("blob");
        let backup_path = path.with_file_name(format!("{}.corrupt-{}", file_name, Utc::now().timestamp_millis()));

        warn!(
            "Stored data in {} is unreadable ({}); treating it as empty and moving it to {}",
            path.display(),
            reason,
            backup_path.display()
        );

        if let Err(e) = fs::rename(path, &backup_path) {
            error!("Failed to move corrupt blob {} aside: {}", path.display(), e);
        }
    }

    /// Blob contents; `None` if missing or unreadable
    fn read_blob(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                self.recover_corrupt_blob(path, &e.to_string());
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[derive(Debug)]
enum PendingChange {
    Write { path: PathBuf, contents: String },
    Remove { path: PathBuf },
}

impl PendingChange {
    fn path(&self) -> &Path {
        match self {
            PendingChange::Write { path, .. } | PendingChange::Remove { path } => path,
        }
    }
}

/// Reads and staged writes of one transaction
///
/// Reads see the batch's own staged changes.
pub struct Batch<'a> {
    connection: &'a JsonConnection,
    pending: Vec<PendingChange>,
}

impl Batch<'_> {
    pub fn read<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let path = self.connection.collection_path(collection);

        let content = match self.pending_for(&path) {
            Some(PendingChange::Write { contents, .. }) => {
                return serde_json::from_str::<Vec<T>>(contents)
                    .with_context(|| format!("Staged {} is not valid", collection.file_name()));
            }
            Some(PendingChange::Remove { .. }) => return Ok(Vec::new()),
            None => match self.connection.read_blob(&path)? {
                Some(content) => content,
                None => return Ok(Vec::new()),
            },
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<T>>(&content) {
            Ok(records) => {
                debug!("Read {} record(s) from {}", records.len(), collection.file_name());
                Ok(records)
            }
            Err(e) => {
                self.connection.recover_corrupt_blob(&path, &e.to_string());
                Ok(Vec::new())
            }
        }
    }

    pub fn write<T: Serialize>(&mut self, collection: Collection, records: &[T]) -> Result<()> {
        let contents = serde_json::to_string(records)
            .with_context(|| format!("Failed to serialize {}", collection.file_name()))?;
        let path = self.connection.collection_path(collection);
        self.stage(PendingChange::Write { path, contents });
        Ok(())
    }

    pub fn read_current_profile_id(&self) -> Result<Option<String>> {
        let path = self.connection.current_profile_path();

        let content = match self.pending_for(&path) {
            Some(PendingChange::Write { contents, .. }) => Some(contents.clone()),
            Some(PendingChange::Remove { .. }) => None,
            None => self.connection.read_blob(&path)?,
        };

        Ok(content
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    pub fn write_current_profile_id(&mut self, profile_id: &str) {
        let path = self.connection.current_profile_path();
        self.stage(PendingChange::Write {
            path,
            contents: profile_id.to_string(),
        });
    }

    /// Stage removal of every blob
    pub fn clear(&mut self) {
        for collection in Collection::ALL {
            let path = self.connection.collection_path(collection);
            self.stage(PendingChange::Remove { path });
        }
        let path = self.connection.current_profile_path();
        self.stage(PendingChange::Remove { path });
    }

    fn pending_for(&self, path: &Path) -> Option<&PendingChange> {
        self.pending.iter().find(|change| change.path() == path)
    }

    fn stage(&mut self, change: PendingChange) {
        self.pending.retain(|existing| existing.path() != change.path());
        self.pending.push(change);
    }

    fn commit(self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let base_directory = self.connection.base_directory();
        fs::create_dir_all(base_directory)
            .with_context(|| format!("Failed to create data directory {}", base_directory.display()))?;

        // Stage every write before touching any live blob
        let mut staged: Vec<(PathBuf, &Path)> = Vec::new();
        for change in &self.pending {
            if let PendingChange::Write { path, contents } = change {
                let temp_path = temp_path_for(path);
                if let Err(e) = fs::write(&temp_path, contents) {
                    for (staged_temp, _) in &staged {
                        let _ = fs::remove_file(staged_temp);
                    }
                    let _ = fs::remove_file(&temp_path);
                    return Err(e).with_context(|| format!("Failed to stage {}", temp_path.display()));
                }
                staged.push((temp_path, path.as_path()));
            }
        }

        for (index, (temp_path, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(temp_path, path) {
                error!(
                    "Failed to replace {}: {}; {} earlier blob(s) already replaced",
                    path.display(),
                    e,
                    index
                );
                for (leftover, _) in &staged[index..] {
                    let _ = fs::remove_file(leftover);
                }
                return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
            }
        }

        for change in &self.pending {
            if let PendingChange::Remove { path } = change {
                match fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).with_context(|| format!("Failed to remove {}", path.display())),
                }
            }
        }

        debug!("Committed {} blob change(s)", self.pending.len());
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("blob");
    path.with_file_name(format!("{}.tmp", file_name))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}
