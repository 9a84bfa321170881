//! Rackspace CloudFiles backend.
//!
//! Speaks the v1 auth handshake: one GET against the region's auth
//! endpoint with `X-Auth-User` / `X-Auth-Key` headers yields an auth
//! token, a storage URL and a CDN management URL. Objects are then
//! plain PUT/GET/DELETE against `{storage_url}/{container}/{path}`.

use super::{Storage, StorageError, StorageResult};
use crate::config::{Container, Provider};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Standard (US) auth endpoint
const AUTH_US: &str = "https://auth.api.rackspacecloud.com/v1.0";
/// London auth endpoint
const AUTH_LON: &str = "https://lon.auth.api.rackspacecloud.com/v1.0";

/// Connection timeout, generous enough for slow large-object transfers
const TIMEOUT: Duration = Duration::from_secs(90);

/// Authenticated connection handle, populated by `authenticate`
struct Session {
    client: Client,
    token: String,
    storage_url: String,
    cdn_management_url: Option<String>,
}

/// Rackspace CloudFiles storage backend
pub struct CloudFilesStorage {
    provider: Provider,
    container: Container,
    session: Option<Session>,
    url: Option<Url>,
}

impl CloudFilesStorage {
    pub fn new(provider: Provider, container: Container) -> Self {
        Self {
            provider,
            container,
            session: None,
            url: None,
        }
    }

    /// Auth endpoint for the provider's region code. Unknown codes fall
    /// back to the standard endpoint rather than failing.
    pub fn auth_endpoint(&self) -> &'static str {
        match self.provider.auth_url.as_deref() {
            Some("ORD") | Some("DFW") | Some("HKG") | Some("IAD") | Some("SYD") => AUTH_US,
            Some("LON") => AUTH_LON,
            _ => AUTH_US,
        }
    }

    fn session(&self) -> StorageResult<&Session> {
        self.session.as_ref().ok_or(StorageError::NotAuthenticated)
    }

    /// URL of one object. Built segment by segment so names with `#`,
    /// `?` or `%` are percent-encoded instead of being read as
    /// fragment/query; `/` separators stay real path segments.
    fn object_url(&self, session: &Session, filename: &str) -> StorageResult<Url> {
        let mut url = Url::parse(&session.storage_url)
            .map_err(|e| Self::transfer_failed(filename, e))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Self::transfer_failed(filename, "storage URL cannot be a base"))?;
            segments.pop_if_empty().push(&self.container.name);
            for part in filename.split('/') {
                segments.push(part);
            }
        }
        Ok(url)
    }

    fn transfer_failed(filename: &str, reason: impl ToString) -> StorageError {
        StorageError::TransferFailed {
            path: filename.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn header_value(
    response: &reqwest::blocking::Response,
    name: &str,
) -> StorageResult<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            StorageError::AuthenticationFailed(format!("auth response is missing {name}"))
        })
}

impl Storage for CloudFilesStorage {
    fn authenticate(&mut self) -> StorageResult<()> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| StorageError::AuthenticationFailed(e.to_string()))?;

        let response = client
            .get(self.auth_endpoint())
            .header("X-Auth-User", &self.provider.name)
            .header("X-Auth-Key", &self.provider.key)
            .send()
            .map_err(|e| StorageError::AuthenticationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::AuthenticationFailed(format!(
                "{} returned {}",
                self.auth_endpoint(),
                response.status()
            )));
        }

        let token = header_value(&response, "X-Auth-Token")?;
        let storage_url = header_value(&response, "X-Storage-Url")?;
        let cdn_management_url = header_value(&response, "X-CDN-Management-Url").ok();

        self.session = Some(Session {
            client,
            token,
            storage_url,
            cdn_management_url,
        });
        // a fresh session invalidates any previously resolved URL
        self.url = None;
        Ok(())
    }

    fn create(&self, filename: &str, data: &[u8]) -> StorageResult<()> {
        let session = self.session()?;
        let response = session
            .client
            .put(self.object_url(session, filename)?)
            .header("X-Auth-Token", &session.token)
            .body(data.to_vec())
            .send()
            .map_err(|e| Self::transfer_failed(filename, e))?;
        if !response.status().is_success() {
            return Err(Self::transfer_failed(filename, response.status()));
        }
        Ok(())
    }

    fn read(&self, filename: &str) -> StorageResult<Vec<u8>> {
        let session = self.session()?;
        let response = session
            .client
            .get(self.object_url(session, filename)?)
            .header("X-Auth-Token", &session.token)
            .send()
            .map_err(|e| Self::transfer_failed(filename, e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::ObjectNotFound(filename.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::transfer_failed(filename, response.status()));
        }
        let bytes = response
            .bytes()
            .map_err(|e| Self::transfer_failed(filename, e))?;
        Ok(bytes.to_vec())
    }

    fn update(&self, filename: &str, data: &[u8]) -> StorageResult<()> {
        self.delete(filename)?;
        self.create(filename, data)
    }

    fn delete(&self, filename: &str) -> StorageResult<()> {
        let session = self.session()?;
        let response = session
            .client
            .delete(self.object_url(session, filename)?)
            .header("X-Auth-Token", &session.token)
            .send()
            .map_err(|e| Self::transfer_failed(filename, e))?;
        if !response.status().is_success() {
            return Err(Self::transfer_failed(filename, response.status()));
        }
        Ok(())
    }

    fn resolve_url(&mut self) -> StorageResult<Url> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        if self.session.is_none() {
            self.authenticate()?;
        }
        let session = self.session()?;

        // prefer the CDN URI from the container's CDN metadata
        let resolved = match &session.cdn_management_url {
            Some(cdn) => {
                let response = session
                    .client
                    .head(format!("{}/{}", cdn, self.container.name))
                    .header("X-Auth-Token", &session.token)
                    .send()
                    .map_err(|e| Self::transfer_failed(&self.container.name, e))?;
                response
                    .headers()
                    .get("X-CDN-URI")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            }
            None => None,
        };
        let url = match resolved {
            Some(raw) => {
                Url::parse(&raw).map_err(|e| Self::transfer_failed(&self.container.name, e))?
            }
            None => {
                let mut url = Url::parse(&session.storage_url)
                    .map_err(|e| Self::transfer_failed(&self.container.name, e))?;
                url.path_segments_mut()
                    .map_err(|_| {
                        Self::transfer_failed(&self.container.name, "storage URL cannot be a base")
                    })?
                    .pop_if_empty()
                    .push(&self.container.name);
                url
            }
        };
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
