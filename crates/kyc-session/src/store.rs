//! Durable session store.
//!
//! Two independent slots live in a [`KeyValueStorage`]: the raw session
//! token and the JSON-serialized [`CurrentUser`]. The store neither encrypts
//! nor expires anything; expiry is judged by [`crate::token`].

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::claims::CurrentUser;
use crate::error::SessionResult;

/// Slot holding the session token.
pub const TOKEN_KEY: &str = "auth_token";

/// Slot holding the serialized current user.
pub const USER_KEY: &str = "auth_user";

/// String key/value storage that survives process restarts.
pub trait KeyValueStorage: Send + Sync {
    /// Reads a slot. Unreadable slots read as absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> SessionResult<()>;

    /// Removes a slot. Removing a missing slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing value could not be removed.
    fn remove(&self, key: &str) -> SessionResult<()>;
}

/// File-backed storage: one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read session slot");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        fs::create_dir_all(&self.dir)?;
        let staging = self.dir.join(format!(".{key}.tmp"));

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // The token is a credential: owner-only from the moment it exists.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&staging)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&staging, self.path(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage, for tests and one-shot processes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        self.slots.lock().remove(key);
        Ok(())
    }
}

/// Token and current-user slots on top of a [`KeyValueStorage`].
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a store over the given storage.
    pub fn new(storage: impl KeyValueStorage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// Creates a store over shared storage.
    #[must_use]
    pub fn from_shared(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Creates an in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Reads the stored token. Blank values read as absent.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.storage
            .get(TOKEN_KEY)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Stores the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn set_token(&self, token: &str) -> SessionResult<()> {
        self.storage.set(TOKEN_KEY, token)
    }

    /// Removes the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage removal fails.
    pub fn clear_token(&self) -> SessionResult<()> {
        self.storage.remove(TOKEN_KEY)
    }

    /// Reads the cached user. Corrupt JSON reads as absent.
    #[must_use]
    pub fn user(&self) -> Option<CurrentUser> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable cached user");
                None
            }
        }
    }

    /// Stores the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn set_user(&self, user: &CurrentUser) -> SessionResult<()> {
        let json = serde_json::to_string(user)?;
        self.storage.set(USER_KEY, &json)
    }

    /// Writes a new token and user together. If the user cannot be
    /// written, both slots are put back to what they held before, so the
    /// store never pairs the new token with the old user.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or either write fails.
    pub fn replace(&self, token: &str, user: &CurrentUser) -> SessionResult<()> {
        let json = serde_json::to_string(user)?;
        let previous_token = self.storage.get(TOKEN_KEY);
        let previous_user = self.storage.get(USER_KEY);

        self.storage.set(TOKEN_KEY, token)?;
        if let Err(e) = self.storage.set(USER_KEY, &json) {
            self.restore(TOKEN_KEY, previous_token.as_deref());
            self.restore(USER_KEY, previous_user.as_deref());
            return Err(e);
        }
        Ok(())
    }

    fn restore(&self, key: &str, previous: Option<&str>) {
        let result = match previous {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        };
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Failed to restore session slot");
        }
    }

    /// Removes the cached user.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage removal fails.
    pub fn clear_user(&self) -> SessionResult<()> {
        self.storage.remove(USER_KEY)
    }

    /// Removes both slots. Failures are logged, never returned, so logout
    /// cannot fail.
    pub fn clear(&self) {
        if let Err(e) = self.clear_token() {
            tracing::warn!(error = %e, "Failed to remove stored token");
        }
        if let Err(e) = self.clear_user() {
            tracing::warn!(error = %e, "Failed to remove cached user");
        }
    }
}
