//! Per-account identity and nonce persistence.
//!
//! Layout: `<root>/<account>/id` and `<root>/<account>/nonce`. Both records
//! are opaque byte blobs replaced wholesale on every write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::account::{is_plain_component, AccountKey};
use crate::config::StoreConfig;
use crate::error::StoreError;

pub const IDENTITY_FILE: &str = "id";
pub const NONCE_FILE: &str = "nonce";

/// Credential store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    root: PathBuf,
}

impl IdentityStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        Ok(Self::new(config.resolved_root()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build `<root>/<account>/<segments...>`.
    ///
    /// Not side-effect free: missing parent directories of the returned path
    /// are created (the account directory itself when `segments` is empty).
    /// Creation is idempotent, so concurrent callers for the same account
    /// both succeed.
    pub fn storage_path_for(
        &self,
        account: &AccountKey,
        segments: &[&str],
    ) -> Result<PathBuf, StoreError> {
        let mut path = self.root.join(account.as_str());
        for segment in segments {
            if !is_plain_component(segment) {
                return Err(StoreError::InvalidSegment((*segment).to_string()));
            }
            path.push(segment);
        }

        let dir = if segments.is_empty() {
            path.as_path()
        } else {
            path.parent().unwrap_or(self.root.as_path())
        };
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        Ok(path)
    }

    pub fn write_identity(&self, account: &AccountKey, identity: &[u8]) -> Result<(), StoreError> {
        self.write_record(account, IDENTITY_FILE, identity)
    }

    /// `Ok(None)` means no identity was provisioned for this account yet.
    pub fn read_identity(&self, account: &AccountKey) -> Result<Option<Vec<u8>>, StoreError> {
        self.read_record(account, IDENTITY_FILE)
    }

    pub fn write_nonce(&self, account: &AccountKey, nonce: &[u8]) -> Result<(), StoreError> {
        self.write_record(account, NONCE_FILE, nonce)
    }

    pub fn read_nonce(&self, account: &AccountKey) -> Result<Option<Vec<u8>>, StoreError> {
        self.read_record(account, NONCE_FILE)
    }

    /// Write to a temp file in the target directory, then rename over the target.
    fn write_record(&self, account: &AccountKey, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.storage_path_for(account, &[name])?;
        let dir = path.parent().unwrap_or(self.root.as_path());

        // NamedTempFile is created 0600 on unix and unlinked on drop if we bail out.
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(data)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;

        debug!(account = %account, record = name, len = data.len(), "record written");
        Ok(())
    }

    fn read_record(&self, account: &AccountKey, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.storage_path_for(account, &[name])?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn key(s: &str) -> AccountKey {
        AccountKey::new(s).unwrap()
    }

    #[test]
    fn identity_file_layout() {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().join("store");
        let store = IdentityStore::new(&root);
        let account = key("15551234567");

        store.write_identity(&account, b"\x01\x02\x03").unwrap();

        let on_disk = fs::read(root.join("15551234567").join("id")).unwrap();
        assert_eq!(on_disk, vec![1, 2, 3]);
        assert_eq!(store.read_identity(&account).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn read_before_write_is_none() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let account = key("15551234567");
        assert!(store.read_identity(&account).unwrap().is_none());
        assert!(store.read_nonce(&account).unwrap().is_none());
    }

    #[test]
    fn binary_identity_roundtrip() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let account = key("15551234567");
        let identity = vec![0u8, 255, 0, 0, 17, 0, 128];

        store.write_identity(&account, &identity).unwrap();
        assert_eq!(store.read_identity(&account).unwrap(), Some(identity));
    }

    #[test]
    fn rotation_replaces_wholesale() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let account = key("15551234567");

        store.write_nonce(&account, b"a much longer first nonce").unwrap();
        store.write_nonce(&account, b"short").unwrap();
        assert_eq!(store.read_nonce(&account).unwrap(), Some(b"short".to_vec()));
    }

    #[test]
    fn identity_and_nonce_are_independent() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let account = key("15551234567");

        store.write_nonce(&account, b"nonce").unwrap();
        assert!(store.read_identity(&account).unwrap().is_none());
        store.write_identity(&account, b"identity").unwrap();
        assert_eq!(store.read_nonce(&account).unwrap(), Some(b"nonce".to_vec()));
    }

    #[test]
    fn accounts_do_not_share_paths_or_records() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let a = key("15551234567");
        let b = key("15551234567-1400000000");

        assert_ne!(
            store.storage_path_for(&a, &["id"]).unwrap(),
            store.storage_path_for(&b, &["id"]).unwrap()
        );

        store.write_identity(&a, b"alice").unwrap();
        assert!(store.read_identity(&b).unwrap().is_none());
    }

    #[test]
    fn normalized_keys_share_path() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        store.write_identity(&key("+15551234567"), b"id").unwrap();
        assert_eq!(
            store.read_identity(&key("15551234567@s.whatsapp.net")).unwrap(),
            Some(b"id".to_vec())
        );
    }

    #[test]
    fn storage_path_creates_directories() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path().join("nested").join("root"));
        let account = key("15551234567");

        let account_dir = store.storage_path_for(&account, &[]).unwrap();
        assert!(account_dir.is_dir());

        let deep = store.storage_path_for(&account, &["media", "thumb.jpg"]).unwrap();
        assert!(deep.parent().unwrap().is_dir());
        assert!(!deep.exists());
    }

    #[test]
    fn storage_path_rejects_bad_segments() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let account = key("15551234567");
        for segment in ["..", "a/b", "", "C:x"] {
            assert!(matches!(
                store.storage_path_for(&account, &[segment]),
                Err(StoreError::InvalidSegment(_))
            ));
        }
    }

    #[test]
    fn concurrent_first_writes_succeed() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = Arc::new(IdentityStore::new(temp_dir.path()));

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.write_nonce(&key("15551234567"), &[i; 16]).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let nonce = store.read_nonce(&key("15551234567")).unwrap().unwrap();
        assert_eq!(nonce.len(), 16);
        assert!(nonce.iter().all(|b| *b == nonce[0]));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let account = key("15551234567");
        store.write_identity(&account, b"id").unwrap();
        store.write_nonce(&account, b"nonce").unwrap();

        let mut names: Vec<String> = fs::read_dir(temp_dir.path().join("15551234567"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["id".to_string(), "nonce".to_string()]);
    }

    #[test]
    fn unreadable_record_is_an_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let account = key("15551234567");
        // A directory where the identity file should be.
        fs::create_dir_all(temp_dir.path().join("15551234567").join("id")).unwrap();

        assert!(matches!(
            store.read_identity(&account),
            Err(StoreError::Io { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn records_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("temp dir");
        let store = IdentityStore::new(temp_dir.path());
        let account = key("15551234567");
        store.write_identity(&account, b"id").unwrap();

        let mode = fs::metadata(temp_dir.path().join("15551234567").join("id"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
