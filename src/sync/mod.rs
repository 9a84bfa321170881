//! Sync module - drive a directory tree through a storage backend.
//!
//! One run: authenticate once, walk the tree in directory order, skip
//! ignored paths, upload every surviving regular file. Uploads are
//! sequential; every run re-uploads unconditionally (no hashing, no
//! mtime comparison). Per-file failures are collected rather than
//! aborting the walk, so one unreadable file does not block the rest.

use crate::ignore::IgnoreList;
use crate::storage::{Storage, StorageError, StorageResult};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

/// Outcome of one sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Number of files uploaded
    pub uploaded: usize,
    /// Relative paths that failed, with the error for each
    pub failed: Vec<(String, StorageError)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sync finished but some files could not be uploaded
#[derive(Error, Debug)]
#[error("{failed} of {total} files failed to sync")]
pub struct PartialSync {
    pub failed: usize,
    pub total: usize,
}

/// Orchestrates one sync run over a backend
pub struct SyncEngine {
    storage: Box<dyn Storage>,
    ignore: IgnoreList,
}

impl SyncEngine {
    pub fn new(storage: Box<dyn Storage>, ignore: IgnoreList) -> Self {
        Self { storage, ignore }
    }

    /// Authenticate, then walk `root` and upload every non-ignored
    /// regular file. Authentication failure is terminal; per-file
    /// read/transfer failures are aggregated into the report.
    pub fn run(&mut self, root: &Path) -> StorageResult<SyncReport> {
        self.storage.authenticate()?;

        let mut report = SyncReport::default();
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    report.failed.push((
                        path.clone(),
                        StorageError::TransferFailed {
                            path,
                            reason: e.to_string(),
                        },
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            // container-relative object name, forward slashes throughout
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            if self.ignore.is_ignored(&relative) {
                continue;
            }
            match self.upload(entry.path(), &relative) {
                Ok(()) => {
                    println!("{}\t{}", "Sync".green(), relative);
                    report.uploaded += 1;
                }
                Err(e) => {
                    eprintln!("{}\t{}: {}", "Fail".red(), relative, e);
                    report.failed.push((relative, e));
                }
            }
        }
        Ok(report)
    }

    fn upload(&self, path: &Path, relative: &str) -> StorageResult<()> {
        let data = std::fs::read(path).map_err(|e| StorageError::TransferFailed {
            path: relative.to_string(),
            reason: e.to_string(),
        })?;
        self.storage.create(relative, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Container, ProviderKind};
    use reqwest::Url;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;
    use std::rc::Rc;
    use tempfile::tempdir;

    /// In-memory backend that records every create call
    struct MockStorage {
        container: Container,
        objects: RefCell<HashMap<String, Vec<u8>>>,
        created: Rc<RefCell<Vec<String>>>,
        fail_auth: bool,
        fail_create_for: Option<String>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                container: Container {
                    provider: ProviderKind::Local,
                    name: "mock".to_string(),
                },
                objects: RefCell::new(HashMap::new()),
                created: Rc::new(RefCell::new(Vec::new())),
                fail_auth: false,
                fail_create_for: None,
            }
        }
    }

    impl Storage for MockStorage {
        fn authenticate(&mut self) -> StorageResult<()> {
            if self.fail_auth {
                return Err(StorageError::AuthenticationFailed(
                    "invalid key".to_string(),
                ));
            }
            Ok(())
        }

        fn create(&self, filename: &str, data: &[u8]) -> StorageResult<()> {
            if self.fail_create_for.as_deref() == Some(filename) {
                return Err(StorageError::TransferFailed {
                    path: filename.to_string(),
                    reason: "injected".to_string(),
                });
            }
            self.created.borrow_mut().push(filename.to_string());
            self.objects
                .borrow_mut()
                .insert(filename.to_string(), data.to_vec());
            Ok(())
        }

        fn read(&self, filename: &str) -> StorageResult<Vec<u8>> {
            self.objects
                .borrow()
                .get(filename)
                .cloned()
                .ok_or_else(|| StorageError::ObjectNotFound(filename.to_string()))
        }

        fn update(&self, filename: &str, data: &[u8]) -> StorageResult<()> {
            self.delete(filename)?;
            self.create(filename, data)
        }

        fn delete(&self, filename: &str) -> StorageResult<()> {
            self.objects.borrow_mut().remove(filename);
            Ok(())
        }

        fn resolve_url(&mut self) -> StorageResult<Url> {
            Ok(Url::parse("https://cdn.example.test/mock").unwrap())
        }

        fn container(&self) -> StorageResult<&Container> {
            Ok(&self.container)
        }
    }

    fn run_engine(
        storage: MockStorage,
        ignore: IgnoreList,
        root: &Path,
    ) -> (StorageResult<SyncReport>, Vec<String>) {
        let created = Rc::clone(&storage.created);
        let mut engine = SyncEngine::new(Box::new(storage), ignore);
        let result = engine.run(root);
        let log = created.borrow().clone();
        (result, log)
    }

    fn write_tree(root: &Path) {
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("node_modules/x")).unwrap();
        fs::write(root.join("src/a.go"), b"package main").unwrap();
        fs::write(root.join(".git/HEAD"), b"ref: refs/heads/main").unwrap();
        fs::write(root.join("node_modules/x/y.js"), b"module.exports = 1").unwrap();
    }

    #[test]
    fn test_walk_uploads_only_non_ignored_files() {
        let dir = tempdir().unwrap();
        write_tree(dir.path());

        let ignore = IgnoreList::from_lines([".git", "node_modules"]).unwrap();
        let (result, created) = run_engine(MockStorage::new(), ignore, dir.path());

        let report = result.unwrap();
        assert_eq!(report.uploaded, 1);
        assert!(report.is_clean());
        assert_eq!(created, vec!["src/a.go".to_string()]);
    }

    #[test]
    fn test_auth_failure_prevents_any_create() {
        let dir = tempdir().unwrap();
        write_tree(dir.path());

        let mut storage = MockStorage::new();
        storage.fail_auth = true;
        let ignore = IgnoreList::from_lines(Vec::<String>::new()).unwrap();
        let (result, created) = run_engine(storage, ignore, dir.path());

        assert!(matches!(
            result.unwrap_err(),
            StorageError::AuthenticationFailed(_)
        ));
        assert!(created.is_empty());
    }

    #[test]
    fn test_transfer_failure_is_aggregated_not_fatal() {
        let dir = tempdir().unwrap();
        write_tree(dir.path());

        let mut storage = MockStorage::new();
        storage.fail_create_for = Some(".git/HEAD".to_string());
        let ignore = IgnoreList::from_lines(["node_modules"]).unwrap();
        let (result, created) = run_engine(storage, ignore, dir.path());

        let report = result.unwrap();
        assert_eq!(report.uploaded, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, ".git/HEAD");
        assert_eq!(created, vec!["src/a.go".to_string()]);
    }

    #[test]
    fn test_empty_ignore_list_syncs_everything() {
        let dir = tempdir().unwrap();
        write_tree(dir.path());

        let ignore = IgnoreList::from_lines(Vec::<String>::new()).unwrap();
        let (result, created) = run_engine(MockStorage::new(), ignore, dir.path());

        assert_eq!(result.unwrap().uploaded, 3);
        assert_eq!(created.len(), 3);
    }

    #[test]
    fn test_update_then_read_roundtrip() {
        let storage = MockStorage::new();
        storage.create("a.txt", b"one").unwrap();
        storage.update("a.txt", b"two").unwrap();
        assert_eq!(storage.read("a.txt").unwrap(), b"two");
    }

    #[test]
    fn test_update_fault_window_leaves_object_absent() {
        let mut storage = MockStorage::new();
        storage.create("a.txt", b"one").unwrap();
        // fault between the delete and create halves of update
        storage.fail_create_for = Some("a.txt".to_string());

        assert!(storage.update("a.txt", b"two").is_err());
        assert!(matches!(
            storage.read("a.txt").unwrap_err(),
            StorageError::ObjectNotFound(_)
        ));
    }
}
