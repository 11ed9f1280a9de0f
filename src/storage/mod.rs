//! # Storage Module
//!
//! Key-value persistence for saved characters.
//!
//! The host decides what backs the store. [`MemoryStore`] keeps everything in
//! process, [`JsonFileStore`] mirrors the map into a single JSON file on every
//! write. Saves are best effort: nothing is transactional, and a crash between
//! a local mutation and the write loses that increment.

use crate::{config, Player};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Errors raised by a key-value store.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Stored data exists but cannot be used
    #[error("Corrupt data: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String-keyed, string-valued persistence.
///
/// Methods take `&self` so one store can be shared between the session
/// context and the multiplayer session.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> StorageResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StorageError::Corrupt("store lock poisoned".to_string()))
}

/// In-process store.
///
/// # Examples
///
/// ```
/// use shadowrealm::{KeyValueStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("greeting", "hello").unwrap();
/// assert_eq!(store.get("greeting").unwrap().as_deref(), Some("hello"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }
}

/// Store persisted as one pretty-printed JSON object.
///
/// The whole file is read on open and rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    StorageError::Corrupt(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Opened store at {} with {} keys", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = lock(&self.entries)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Saves and loads characters under `mmo_character_<userId>`.
#[derive(Debug, Clone)]
pub struct CharacterStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CharacterStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The storage key for a user's character.
    ///
    /// # Examples
    ///
    /// ```
    /// use shadowrealm::{CharacterStore, MemoryStore};
    ///
    /// assert_eq!(
    ///     CharacterStore::<MemoryStore>::key_for("user_42"),
    ///     "mmo_character_user_42"
    /// );
    /// ```
    pub fn key_for(user_id: &str) -> String {
        format!("{}_{}", config::CHARACTER_STORAGE_PREFIX, user_id)
    }

    pub fn load(&self, user_id: &str) -> StorageResult<Option<Player>> {
        match self.store.get(&Self::key_for(user_id))? {
            Some(raw) => {
                let mut player: Player = serde_json::from_str(&raw)?;
                player.clamp_resources();
                Ok(Some(player))
            }
            None => Ok(None),
        }
    }

    pub fn save(&self, player: &Player) -> StorageResult<()> {
        let json = serde_json::to_string(player)?;
        self.store.set(&Self::key_for(&player.user_id), &json)
    }

    /// Saves and logs instead of failing. Used on hot paths such as movement.
    pub fn save_best_effort(&self, player: &Player) -> bool {
        match self.save(player) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save character {}: {}", player.character_name, e);
                false
            }
        }
    }

    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        self.store.remove(&Self::key_for(user_id))
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}
