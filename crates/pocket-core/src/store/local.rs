//! Local filesystem blob store

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{validate_key, BlobStore, StoredObject};
use crate::error::{Error, Result};

/// Blob store keeping each object as a file under a root directory
///
/// Key segments map to nested directories, so `savings/2024-05/summary.json`
/// lives at `<root>/savings/2024-05/summary.json`.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a new local store
    ///
    /// Creates the root directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| {
                Error::Store(format!(
                    "Failed to create store directory {}: {}",
                    root.display(),
                    e
                ))
            })?;
            info!("Created store directory: {}", root.display());
        }

        Ok(Self { root })
    }

    /// Get the root directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        key.split('/').fold(self.root.clone(), |path, seg| path.join(seg))
    }

    /// Collect every object file below `dir`
    fn walk(&self, dir: &Path, out: &mut Vec<StoredObject>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                self.walk(&path, out)?;
                continue;
            }

            // In-flight writes
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let Some(key) = self.key_for(&path) else {
                continue;
            };
            out.push(StoredObject {
                key,
                body: fs::read(&path)?,
            });
        }
        Ok(())
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
        segments.map(|s| s.join("/"))
    }
}

impl BlobStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        match fs::read(self.object_path(key)) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Store(format!("Failed to read {}: {}", key, e))),
        }
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        validate_key(key)?;
        let path = self.object_path(key);
        let parent = path
            .parent()
            .ok_or_else(|| Error::Store(format!("Invalid key: {:?}", key)))?;
        fs::create_dir_all(parent)?;

        // Write beside the target then rename so readers never see a torn file
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tmp_path = parent.join(format!(".{}.tmp", file_name));
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Store(format!("Failed to write {}: {}", key, e)))?;

        debug!(key, bytes = body.len(), "Stored object");
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        // Only walk the deepest directory the prefix pins down
        let dir = match prefix.rfind('/') {
            Some(idx) => {
                let dir_key = &prefix[..idx];
                validate_key(dir_key)?;
                self.object_path(dir_key)
            }
            None => self.root.clone(),
        };

        let mut objects = Vec::new();
        self.walk(&dir, &mut objects)?;
        objects.retain(|o| o.key.starts_with(prefix));
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("store")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_new_creates_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("new_store");
        assert!(!root.exists());

        let _store = LocalStore::new(&root).unwrap();
        assert!(root.exists());
    }

    #[test]
    fn test_put_and_get() {
        let (_dir, store) = setup_test_store();

        store
            .put("savings/2024-05/summary.json", br#"{"month":"2024-05"}"#)
            .unwrap();

        let body = store.get("savings/2024-05/summary.json").unwrap().unwrap();
        assert_eq!(body, br#"{"month":"2024-05"}"#);
        assert!(store
            .root()
            .join("savings")
            .join("2024-05")
            .join("summary.json")
            .exists());
    }

    #[test]
    fn test_get_missing() {
        let (_dir, store) = setup_test_store();
        assert!(store.get("savings/2024-05/summary.json").unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let (_dir, store) = setup_test_store();
        store.put("investments/2024-05-01.json", b"first").unwrap();
        store.put("investments/2024-05-01.json", b"second").unwrap();

        assert_eq!(
            store.get("investments/2024-05-01.json").unwrap().unwrap(),
            b"second"
        );
        // No temp files left behind
        assert_eq!(store.list("investments/").unwrap().len(), 1);
    }

    #[test]
    fn test_list_by_prefix() {
        let (_dir, store) = setup_test_store();
        store.put("expenses/2024-05/2024-05-02.json", b"2").unwrap();
        store.put("expenses/2024-05/2024-05-01.json", b"1").unwrap();
        store.put("expenses/2024-06/2024-06-01.json", b"3").unwrap();

        let may = store.list("expenses/2024-05/").unwrap();
        let keys: Vec<&str> = may.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "expenses/2024-05/2024-05-01.json",
                "expenses/2024-05/2024-05-02.json"
            ]
        );

        assert_eq!(store.list("expenses/").unwrap().len(), 3);
        assert!(store.list("reports/2024-05/").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_traversal() {
        let (_dir, store) = setup_test_store();
        assert!(store.put("../outside.json", b"x").is_err());
        assert!(store.get("expenses/../../etc/passwd").is_err());
    }
}
