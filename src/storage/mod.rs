//! Storage module - the uniform backend contract and its implementations.
//!
//! Every provider kind implements the same CRUD + authenticate +
//! resolve-URL contract; backends are picked by a kind-keyed factory.
//!
//! - `cloudfiles`: Rackspace CloudFiles over HTTP
//! - `local`: plain filesystem, mostly useful for testing

pub mod cloudfiles;
pub mod local;

use crate::config::{Container, Provider, ProviderKind};
use reqwest::Url;
use thiserror::Error;

pub use cloudfiles::CloudFilesStorage;
pub use local::LocalStorage;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no storage backend for provider {0}")]
    UnsupportedProvider(ProviderKind),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("storage is not authenticated")]
    NotAuthenticated,

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("transfer failed for {path}: {reason}")]
    TransferFailed { path: String, reason: String },

    #[error("empty container")]
    EmptyContainer,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Uniform contract every storage backend implements.
///
/// A backend owns one ephemeral session per run: authenticate once,
/// then push objects through it. `create` is upsert-by-overwrite;
/// `update` is delete-then-create and therefore not atomic.
pub trait Storage {
    /// Establish a session from the provider credentials. May be called
    /// again to re-authenticate; resets any cached resolved URL.
    fn authenticate(&mut self) -> StorageResult<()>;

    /// Upload content at a container-relative path, overwriting any
    /// existing object.
    fn create(&self, filename: &str, data: &[u8]) -> StorageResult<()>;

    /// Fetch object content.
    fn read(&self, filename: &str) -> StorageResult<Vec<u8>>;

    /// Delete then create. A failure between the two steps leaves the
    /// object absent.
    fn update(&self, filename: &str, data: &[u8]) -> StorageResult<()>;

    /// Remove the object.
    fn delete(&self, filename: &str) -> StorageResult<()>;

    /// Public URL of the container, resolved lazily and memoized for
    /// the session. Re-authenticates first when the session is gone.
    fn resolve_url(&mut self) -> StorageResult<Url>;

    /// The bound container identity.
    fn container(&self) -> StorageResult<&Container>;
}

/// Build the backend for a container's provider kind
pub fn from_config(
    provider: &Provider,
    container: &Container,
) -> StorageResult<Box<dyn Storage>> {
    match container.provider {
        ProviderKind::CloudFiles => Ok(Box::new(CloudFilesStorage::new(
            provider.clone(),
            container.clone(),
        ))),
        ProviderKind::Local => Ok(Box::new(LocalStorage::new(
            container.clone(),
            local::default_base_dir(),
        ))),
        ProviderKind::S3 => Err(StorageError::UnsupportedProvider(ProviderKind::S3)),
    }
}
