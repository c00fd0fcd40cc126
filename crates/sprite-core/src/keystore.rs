//! Small string key-value stores for client-side wallet state.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::SpriteError;

pub trait KeyStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, SpriteError>;
    fn store(&self, key: &str, value: &str) -> Result<(), SpriteError>;
    fn remove(&self, key: &str) -> Result<(), SpriteError>;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-local store, mostly for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn load(&self, key: &str) -> Result<Option<String>, SpriteError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<(), SpriteError> {
        lock(&self.entries).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SpriteError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// One file per key under `dir`. Files are written owner-only on unix.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// ASCII alphanumerics and `-` are kept, every other byte becomes
    /// `_xx`, so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for b in key.bytes() {
            if b.is_ascii_alphanumeric() || b == b'-' {
                file.push(char::from(b));
            } else {
                file.push_str(&format!("_{b:02x}"));
            }
        }
        self.dir.join(file)
    }
}

fn write_private(path: &Path, value: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

impl KeyStore for FileKeyStore {
    fn load(&self, key: &str) -> Result<Option<String>, SpriteError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SpriteError::Storage(format!("read {key}: {e}"))),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<(), SpriteError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| SpriteError::Storage(format!("create {}: {e}", self.dir.display())))?;
        write_private(&self.path_for(key), value)
            .map_err(|e| SpriteError::Storage(format!("write {key}: {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), SpriteError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SpriteError::Storage(format!("remove {key}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn KeyStore) {
        assert_eq!(store.load("ivy:k").unwrap(), None);
        store.store("ivy:k", "[1,2,3]").unwrap();
        assert_eq!(store.load("ivy:k").unwrap().as_deref(), Some("[1,2,3]"));
        store.store("ivy:k", "[4]").unwrap();
        assert_eq!(store.load("ivy:k").unwrap().as_deref(), Some("[4]"));
        store.remove("ivy:k").unwrap();
        assert_eq!(store.load("ivy:k").unwrap(), None);
        // Removing twice is fine.
        store.remove("ivy:k").unwrap();
    }

    #[test]
    fn memory_store() {
        exercise(&MemoryKeyStore::new());
    }

    #[test]
    fn file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("nested"));
        exercise(&store);
    }

    #[test]
    fn file_names_are_sanitized() {
        let store = FileKeyStore::new("/tmp/x");
        assert_eq!(
            store.path_for("ivy:keypair-wallet-adapter"),
            PathBuf::from("/tmp/x/ivy_3akeypair-wallet-adapter")
        );
        assert_eq!(store.path_for("../etc"), PathBuf::from("/tmp/x/_2e_2e_2fetc"));
    }

    #[test]
    fn distinct_keys_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        assert_ne!(store.path_for("ivy:a"), store.path_for("ivy_a"));

        store.store("ivy:a", "colon").unwrap();
        store.store("ivy_a", "underscore").unwrap();
        assert_eq!(store.load("ivy:a").unwrap().as_deref(), Some("colon"));
        assert_eq!(store.load("ivy_a").unwrap().as_deref(), Some("underscore"));
    }

    #[cfg(unix)]
    #[test]
    fn stored_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        store.store("ivy:k", "[1]").unwrap();
        let mode = std::fs::metadata(store.path_for("ivy:k"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600, "got {mode:o}");

        // An existing world-readable file is tightened on the next write.
        let loose = store.path_for("ivy:old");
        std::fs::write(&loose, "[2]").unwrap();
        std::fs::set_permissions(&loose, std::fs::Permissions::from_mode(0o644)).unwrap();
        store.store("ivy:old", "[3]").unwrap();
        let mode = std::fs::metadata(&loose).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "got {mode:o}");
        assert_eq!(store.load("ivy:old").unwrap().as_deref(), Some("[3]"));
    }
}
