use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use crate::error::StoreError;

/// Key holding the most recently minted link token.
pub const LINK_TOKEN_KEY: &str = "link_token";

/// Durable key/value slot that survives a full OAuth redirect.
pub trait TokenStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Flat JSON object on disk, e.g. `{"link_token": "link-sandbox-..."}`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&values)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

/// Store that lives as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    values: HashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn with(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/test_stores")
            .join(format!("store_{}.json", Uuid::new_v4()))
    }

    #[test]
    fn file_store_round_trips_and_keeps_other_keys() {
        let path = scratch_path();
        let mut store = FileTokenStore::new(&path);
        assert_eq!(store.path(), path.as_path());

        assert_eq!(store.load(LINK_TOKEN_KEY).unwrap(), None);

        store.save("other", "kept").unwrap();
        store.save(LINK_TOKEN_KEY, "tok_1").unwrap();
        store.save(LINK_TOKEN_KEY, "tok_2").unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.load(LINK_TOKEN_KEY).unwrap().as_deref(), Some("tok_2"));
        assert_eq!(reopened.load("other").unwrap().as_deref(), Some("kept"));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(matches!(store.load(LINK_TOKEN_KEY), Err(StoreError::Json(_))));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn memory_store() {
        let mut store = MemoryTokenStore::with(LINK_TOKEN_KEY, "tok_123");
        assert_eq!(store.load(LINK_TOKEN_KEY).unwrap().as_deref(), Some("tok_123"));
        store.save(LINK_TOKEN_KEY, "tok_456").unwrap();
        assert_eq!(store.load(LINK_TOKEN_KEY).unwrap().as_deref(), Some("tok_456"));
        assert_eq!(store.load("missing").unwrap(), None);
    }
}
