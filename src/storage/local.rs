//! Local filesystem backend. Objects live under a root directory named
//! after the container; useful for offline runs and for tests.

use super::{Storage, StorageError, StorageResult};
use crate::config::Container;
use reqwest::Url;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Base directory Local containers live under when none is given
/// (`~/.local/share/cloudsync` on Linux)
pub fn default_base_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("cloudsync"))
        .unwrap_or_else(|| PathBuf::from(".cloudsync"))
}

/// Filesystem-backed storage
pub struct LocalStorage {
    container: Container,
    root: PathBuf,
    authenticated: bool,
    url: Option<Url>,
}

impl LocalStorage {
    /// Objects go to `{base}/{container.name}`
    pub fn new(container: Container, base: PathBuf) -> Self {
        let root = base.join(&container.name);
        Self {
            container,
            root,
            authenticated: false,
            url: None,
        }
    }

    fn object_path(&self, filename: &str) -> StorageResult<PathBuf> {
        if !self.authenticated {
            return Err(StorageError::NotAuthenticated);
        }
        Ok(self.root.join(filename))
    }

    fn transfer_failed(filename: &str, reason: impl ToString) -> StorageError {
        StorageError::TransferFailed {
            path: filename.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Storage for LocalStorage {
    /// No remote session to establish; just make sure the root exists.
    fn authenticate(&mut self) -> StorageResult<()> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::AuthenticationFailed(e.to_string()))?;
        self.authenticated = true;
        self.url = None;
        Ok(())
    }

    fn create(&self, filename: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.object_path(filename)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Self::transfer_failed(filename, e))?;
        }
        std::fs::write(&path, data).map_err(|e| Self::transfer_failed(filename, e))
    }

    fn read(&self, filename: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(filename)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::ObjectNotFound(filename.to_string()),
            _ => Self::transfer_failed(filename, e),
        })
    }

    fn update(&self, filename: &str, data: &[u8]) -> StorageResult<()> {
        self.delete(filename)?;
        self.create(filename, data)
    }

    fn delete(&self, filename: &str) -> StorageResult<()> {
        let path = self.object_path(filename)?;
        std::fs::remove_file(&path).map_err(|e| Self::transfer_failed(filename, e))
    }

    fn resolve_url(&mut self) -> StorageResult<Url> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        if !self.authenticated {
            self.authenticate()?;
        }
        let url = Url::from_directory_path(&self.root).map_err(|_| {
            Self::transfer_failed(&self.container.name, "root is not an absolute path")
        })?;
        self.url = Some(url.clone());
        Ok(url)
    }

    fn container(&self) -> StorageResult<&Container> {
        if self.container.name.is_empty() {
            return Err(StorageError::EmptyContainer);
        }
        Ok(&self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use tempfile::tempdir;

    fn local(base: PathBuf) -> LocalStorage {
        LocalStorage::new(
            Container {
                provider: ProviderKind::Local,
                name: "vault".to_string(),
            },
            base,
        )
    }

    #[test]
    fn test_create_requires_authentication() {
        let dir = tempdir().unwrap();
        let storage = local(dir.path().to_path_buf());
        assert!(matches!(
            storage.create("a.txt", b"x").unwrap_err(),
            StorageError::NotAuthenticated
        ));
    }

    #[test]
    fn test_create_read_roundtrip() {
        let dir = tempdir().unwrap();
        let mut storage = local(dir.path().to_path_buf());
        storage.authenticate().unwrap();

        storage.create("src/a.go", b"package main").unwrap();
        assert_eq!(storage.read("src/a.go").unwrap(), b"package main");
    }

    #[test]
    fn test_create_overwrites() {
        let dir = tempdir().unwrap();
        let mut storage = local(dir.path().to_path_buf());
        storage.authenticate().unwrap();

        storage.create("a.txt", b"one").unwrap();
        storage.create("a.txt", b"two").unwrap();
        assert_eq!(storage.read("a.txt").unwrap(), b"two");
    }

    #[test]
    fn test_update_roundtrip() {
        let dir = tempdir().unwrap();
        let mut storage = local(dir.path().to_path_buf());
        storage.authenticate().unwrap();

        storage.create("a.txt", b"one").unwrap();
        storage.update("a.txt", b"two").unwrap();
        assert_eq!(storage.read("a.txt").unwrap(), b"two");
    }

    #[test]
    fn test_delete_then_read_is_not_found() {
        let dir = tempdir().unwrap();
        let mut storage = local(dir.path().to_path_buf());
        storage.authenticate().unwrap();

        storage.create("a.txt", b"x").unwrap();
        storage.delete("a.txt").unwrap();
        assert!(matches!(
            storage.read("a.txt").unwrap_err(),
            StorageError::ObjectNotFound(_)
        ));
    }

    #[test]
    fn test_resolve_url_is_memoized() {
        let dir = tempdir().unwrap();
        let mut storage = local(dir.path().to_path_buf());
        let first = storage.resolve_url().unwrap();
        let second = storage.resolve_url().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.scheme(), "file");
    }

    #[test]
    fn test_reauthenticate_invalidates_resolved_url() {
        let dir = tempdir().unwrap();
        let mut storage = local(dir.path().to_path_buf());

        let first = storage.resolve_url().unwrap();
        assert!(storage.url.is_some());

        storage.authenticate().unwrap();
        assert!(storage.url.is_none());

        // re-resolved after the reset, same container root
        assert_eq!(storage.resolve_url().unwrap(), first);
    }
}
