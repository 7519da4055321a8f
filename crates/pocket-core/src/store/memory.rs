//! In-process blob store

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{validate_key, BlobStore, StoredObject};
use crate::error::{Error, Result};

/// Blob store backed by an in-memory ordered map
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently stored, in order
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> Error {
    Error::Store("Memory store lock poisoned".into())
}

impl BlobStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects.get(key).cloned())
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut objects = self.objects.write().map_err(|_| poisoned())?;
        objects.insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, body)| StoredObject {
                key: key.clone(),
                body: body.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_overwrite() {
        let store = MemoryStore::new();
        assert!(store.get("a/x.json").unwrap().is_none());

        store.put("a/x.json", b"one").unwrap();
        store.put("a/x.json", b"two").unwrap();

        assert_eq!(store.get("a/x.json").unwrap().unwrap(), b"two");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_by_prefix() {
        let store = MemoryStore::new();
        store.put("expenses/2024-05/2024-05-02.json", b"2").unwrap();
        store.put("expenses/2024-05/2024-05-01.json", b"1").unwrap();
        store.put("expenses/2024-06/2024-06-01.json", b"3").unwrap();
        store.put("savings/2024-05/summary.json", b"s").unwrap();

        let listed = store.list("expenses/2024-05/").unwrap();
        let keys: Vec<&str> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "expenses/2024-05/2024-05-01.json",
                "expenses/2024-05/2024-05-02.json"
            ]
        );
        assert_eq!(listed[0].body, b"1");

        assert!(store.list("reports/").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_invalid_keys() {
        let store = MemoryStore::new();
        assert!(store.put("../x", b"x").is_err());
        assert!(store.is_empty());
    }
}
