//! Async HTTP adapters that resolve a dependency's license identifiers.
//!
//! Each ecosystem module exposes `lookup(client, coordinate)`, which walks that
//! ecosystem's fallback chain and stops at the first source that returns a
//! non-empty license list. Lookups never fail: transport errors, non-200
//! responses, timeouts and malformed bodies are logged and the dependency
//! degrades to [`LicenseRecord::unknown`].

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::config::Endpoints;
use crate::error::LookupError;
use crate::models::{Coordinate, Ecosystem, LicenseRecord};

pub mod deps_dev;
pub mod github;
pub mod maven;
pub mod npm;
pub mod pypi;

/// HTTP client plus the endpoints every adapter talks to.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: Client,
    endpoints: Endpoints,
    github_token: Option<String>,
}

impl RegistryClient {
    pub fn new(http: Client, endpoints: Endpoints) -> Self {
        Self {
            http,
            endpoints,
            github_token: None,
        }
    }

    /// Authenticate GitHub API calls (raises the rate limit).
    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, LookupError> {
        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if url.starts_with(self.endpoints.github_api.as_str()) {
            if let Some(token) = &self.github_token {
                request = request.header(AUTHORIZATION, format!("Bearer {}", token));
            }
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    /// GET `url` and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LookupError> {
        let body = self.get(url).await?.text().await?;
        serde_json::from_str(&body).map_err(|err| LookupError::Malformed {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    /// GET `url` and return the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, LookupError> {
        Ok(self.get(url).await?.text().await?)
    }
}

/// Percent-encode one URL path segment (`@scope/pkg` -> `%40scope%2Fpkg`,
/// `group:artifact` -> `group%3Aartifact`).
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

/// Per-scan license lookup front door: dispatches on the ecosystem and
/// memoizes results so a dependency declared in several manifests is only
/// looked up once. Concurrent lookups of one coordinate share a single fetch.
#[derive(Debug)]
pub struct LicenseLookup {
    client: RegistryClient,
    cache: Mutex<HashMap<Coordinate, Arc<OnceCell<LicenseRecord>>>>,
}

impl LicenseLookup {
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn lookup(&self, coordinate: &Coordinate) -> LicenseRecord {
        let cell = self
            .cache
            .lock()
            .await
            .entry(coordinate.clone())
            .or_default()
            .clone();
        cell.get_or_init(|| self.fetch(coordinate)).await.clone()
    }

    async fn fetch(&self, coordinate: &Coordinate) -> LicenseRecord {
        let record = match coordinate.ecosystem {
            Ecosystem::Maven => maven::lookup(&self.client, coordinate).await,
            Ecosystem::PyPI => pypi::lookup(&self.client, coordinate).await,
            Ecosystem::Npm => npm::lookup(&self.client, coordinate).await,
        };
        debug!(
            "{} {}@{} -> {:?} via {}",
            coordinate.ecosystem,
            coordinate.identity(),
            coordinate.version,
            record.identifiers,
            record.source
        );
        record
    }
}
