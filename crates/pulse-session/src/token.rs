//! Persistence of the session token.
//!
//! One token string is kept under the key [`TOKEN_KEY`]. The file store
//! keeps a JSON object so it can share the file with other local state.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::SessionError;

/// Storage key of the session token.
pub const TOKEN_KEY: &str = "auth_token";

/// Where the session token survives restarts.
pub trait TokenStore: Send + Sync {
    /// Returns the persisted token, if any.
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Persists `token`, replacing any previous one.
    fn save(&self, token: &str) -> Result<(), SessionError>;

    /// Forgets the token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), SessionError>;
}

/// In-process store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// Store backed by a JSON file.
///
/// A missing file is an empty store. Keys other than [`TOKEN_KEY`] are
/// preserved on every write.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(SessionError::storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_map(&self, map: Map<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock();
        let map = self.read_map()?;
        Ok(map.get(TOKEN_KEY).and_then(Value::as_str).map(str::to_string))
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        map.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_map(map)
    }

    fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        if map.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save("token-7").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("token-7"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("state").join("session.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save("token-12").unwrap();

        let reopened = FileTokenStore::new(store.path());
        assert_eq!(reopened.load().unwrap().as_deref(), Some("token-12"));

        reopened.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{ "selected_site": "Hwaseong" }"#).unwrap();

        let store = FileTokenStore::new(&path);
        store.save("token-3").unwrap();
        store.clear().unwrap();

        let content: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["selected_site"], "Hwaseong");
        assert!(content.get(TOKEN_KEY).is_none());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2]").unwrap();

        let err = FileTokenStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SessionError::Storage { .. }));
    }
}
