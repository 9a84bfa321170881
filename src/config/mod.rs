//! Config module - the two layered JSON config documents.
//!
//! - `~/.cloudcore` holds per-user provider credentials (`Core`)
//! - `./.cloud` holds the per-project container list (`Cloud`)
//!
//! Both are read once at startup and never written back during a sync;
//! only `cloud init` creates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the per-user credential config
pub const CLOUDCORE_FILE: &str = ".cloudcore";
/// File name of the per-project container config
pub const CLOUD_FILE: &str = ".cloud";
/// File name of the ignore config
pub const CLOUDIGNORE_FILE: &str = ".cloudignore";

/// Errors from loading configs and resolving containers/providers
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Missing {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(".cloud has no containers")]
    NoContainersConfigured,

    #[error("no container named \"{0}\" in .cloud")]
    ContainerNotFound(String),

    #[error("no {0} provider in .cloudcore")]
    ProviderNotFound(ProviderKind),
}

/// Supported storage provider kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Rackspace CloudFiles
    CloudFiles,
    /// Amazon S3 (declared, no backend yet)
    S3,
    /// Local filesystem
    Local,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::CloudFiles => write!(f, "CloudFiles"),
            ProviderKind::S3 => write!(f, "S3"),
            ProviderKind::Local => write!(f, "Local"),
        }
    }
}

/// One provider credential entry in `.cloudcore`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    /// Which backend this credential belongs to
    pub provider: ProviderKind,
    /// Account identifier (user name)
    pub name: String,
    /// API key
    pub key: String,
    /// Optional API secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Optional region code for the auth endpoint (e.g. "LON")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
}

/// `~/.cloudcore` - the per-user credential list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Core {
    pub providers: Vec<Provider>,
}

/// One remote container bound to a provider kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub provider: ProviderKind,
    pub name: String,
}

/// `./.cloud` - the per-project container list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub containers: Vec<Container>,
}

/// Path of `~/.cloudcore`, falling back to the working directory when
/// no home directory can be determined.
pub fn cloudcore_path() -> PathBuf {
    dirs::home_dir()
        .map(|d| d.join(CLOUDCORE_FILE))
        .unwrap_or_else(|| PathBuf::from(CLOUDCORE_FILE))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Missing {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

impl Core {
    /// Load `.cloudcore` from the home directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&cloudcore_path())
    }

    /// Load a credential config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    /// Find the credential for a container's provider kind.
    /// Linear scan, first match wins.
    pub fn provider_for(&self, container: &Container) -> Result<&Provider, ConfigError> {
        self.providers
            .iter()
            .find(|p| p.provider == container.provider)
            .ok_or(ConfigError::ProviderNotFound(container.provider))
    }

    /// Default template written by `cloud init`
    pub fn template() -> Self {
        Self {
            providers: vec![Provider {
                provider: ProviderKind::CloudFiles,
                name: "myaccountname".to_string(),
                key: "mykeyhere".to_string(),
                secret: Some("mysecrethere".to_string()),
                auth_url: Some("LON".to_string()),
            }],
        }
    }
}

impl Cloud {
    /// Load `.cloud` from the current working directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CLOUD_FILE))
    }

    /// Load a container config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    /// Select a container by name. An empty name selects the first
    /// entry; otherwise the match is exact and case-sensitive.
    pub fn select(&self, name: &str) -> Result<&Container, ConfigError> {
        if self.containers.is_empty() {
            return Err(ConfigError::NoContainersConfigured);
        }
        if name.is_empty() {
            return Ok(&self.containers[0]);
        }
        self.containers
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::ContainerNotFound(name.to_string()))
    }

    /// Default template written by `cloud init`
    pub fn template() -> Self {
        Self {
            containers: vec![Container {
                provider: ProviderKind::CloudFiles,
                name: "containername".to_string(),
            }],
        }
    }
}

/// Serialize a config as pretty JSON and write it to `path`
pub fn write_config<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    std::fs::write(path, data)?;
    Ok(())
}
