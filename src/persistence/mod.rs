//! Key-value score storage
//!
//! Backends:
//! - `MemoryStore`: in-process map (tests, hosts without storage)
//! - `JsonFileStore`: JSON object on disk, written via tmp file + rename (native)
//! - `LocalStore`: browser LocalStorage (wasm32)
//!
//! Failures are reported as [`StoreError`]; callers decide whether they
//! matter. The best score treats every failure as "nothing stored".

use std::collections::HashMap;

use thiserror::Error;

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data is malformed: {0}")]
    Parse(String),
    #[error("storage is unavailable")]
    Unavailable,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Parse(err.to_string())
    }
}

/// Integer key-value storage used for the best score
pub trait ScoreStore: Send {
    /// `Ok(None)` when nothing is stored under `key`
    fn load(&self, key: &str) -> Result<Option<u64>, StoreError>;
    fn save(&mut self, key: &str, value: u64) -> Result<(), StoreError>;
}

/// Volatile store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn save(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::JsonFileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::collections::HashMap;
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::{ScoreStore, StoreError};

    /// All keys in one JSON object file
    #[derive(Debug, Clone)]
    pub struct JsonFileStore {
        path: PathBuf,
    }

    impl JsonFileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn read_all(&self) -> Result<HashMap<String, u64>, StoreError> {
            match fs::read_to_string(&self.path) {
                Ok(json) => Ok(serde_json::from_str(&json)?),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
                Err(err) => Err(err.into()),
            }
        }
    }

    impl ScoreStore for JsonFileStore {
        fn load(&self, key: &str) -> Result<Option<u64>, StoreError> {
            Ok(self.read_all()?.get(key).copied())
        }

        fn save(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
            // A corrupt file is replaced rather than blocking the save
            let mut values = self.read_all().unwrap_or_else(|err| {
                log::warn!("Replacing unreadable score file {:?}: {}", self.path, err);
                HashMap::new()
            });
            values.insert(key.to_string(), value);

            let json = serde_json::to_string_pretty(&values)?;
            let tmp = self.path.with_extension("tmp");
            fs::write(&tmp, json)?;
            fs::rename(&tmp, &self.path)?;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use super::{ScoreStore, StoreError};

    /// Browser LocalStorage; values are stored as plain decimal strings
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalStore;

    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StoreError::Unavailable)
    }

    impl ScoreStore for LocalStore {
        fn load(&self, key: &str) -> Result<Option<u64>, StoreError> {
            let raw = storage()?
                .get_item(key)
                .map_err(|_| StoreError::Unavailable)?;
            match raw {
                Some(text) => text
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|err| StoreError::Parse(err.to_string())),
                None => Ok(None),
            }
        }

        fn save(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
            storage()?
                .set_item(key, &value.to_string())
                .map_err(|_| StoreError::Unavailable)
        }
    }
}

/// Store whose every call fails
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct BrokenStore;

#[cfg(test)]
impl ScoreStore for BrokenStore {
    fn load(&self, _key: &str) -> Result<Option<u64>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn save(&mut self, _key: &str, _value: u64) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}
