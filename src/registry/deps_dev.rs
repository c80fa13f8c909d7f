//! deps.dev: the language-agnostic aggregator queried first for every ecosystem.

use serde::Deserialize;
use tracing::debug;

use super::{encode_segment, RegistryClient};
use crate::error::LookupError;
use crate::models::Ecosystem;

#[derive(Debug, Deserialize)]
struct PackageResponse {
    #[serde(default)]
    versions: Vec<PackageVersion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageVersion {
    version_key: Option<VersionKey>,
    version: Option<String>,
    #[serde(alias = "published")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionKey {
    version: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    licenses: Vec<String>,
}

/// A version from the package-level listing with its publish timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVersion {
    pub version: String,
    /// RFC 3339 timestamp string; empty when deps.dev has none.
    pub published: String,
}

fn package_url(client: &RegistryClient, ecosystem: Ecosystem, name: &str) -> String {
    format!(
        "{}/systems/{}/packages/{}",
        client.endpoints().deps_dev.trim_end_matches('/'),
        ecosystem.deps_dev_system(),
        encode_segment(name)
    )
}

/// Every known version of a package.
pub async fn package_versions(
    client: &RegistryClient,
    ecosystem: Ecosystem,
    name: &str,
) -> Result<Vec<PublishedVersion>, LookupError> {
    let body: PackageResponse = client.get_json(&package_url(client, ecosystem, name)).await?;
    Ok(body
        .versions
        .into_iter()
        .filter_map(|v| {
            let version = v.version_key.map(|k| k.version).or(v.version)?;
            Some(PublishedVersion {
                version,
                published: v.published_at.unwrap_or_default(),
            })
        })
        .collect())
}

/// License identifiers of one package version.
pub async fn licenses(
    client: &RegistryClient,
    ecosystem: Ecosystem,
    name: &str,
    version: &str,
) -> Result<Vec<String>, LookupError> {
    let url = format!(
        "{}/versions/{}",
        package_url(client, ecosystem, name),
        encode_segment(version)
    );
    let body: VersionResponse = client.get_json(&url).await?;
    Ok(body.licenses)
}

/// The most recently published version: greatest timestamp string wins.
pub fn latest(versions: &[PublishedVersion]) -> Option<&PublishedVersion> {
    versions.iter().max_by(|a, b| a.published.cmp(&b.published))
}

/// Resolve a floating version (`latest`, `*`, `unknown`) to the newest release.
pub async fn resolve_latest(
    client: &RegistryClient,
    ecosystem: Ecosystem,
    name: &str,
) -> Option<String> {
    match package_versions(client, ecosystem, name).await {
        Ok(versions) => latest(&versions).map(|v| v.version.clone()),
        Err(err) => {
            debug!("deps.dev version listing for {} failed: {}", name, err);
            None
        }
    }
}

/// Query deps.dev for `name@version`, logging and swallowing failures.
pub async fn try_licenses(
    client: &RegistryClient,
    ecosystem: Ecosystem,
    name: &str,
    version: &str,
) -> Vec<String> {
    match licenses(client, ecosystem, name, version).await {
        Ok(found) => found,
        Err(err) => {
            debug!("deps.dev lookup for {}@{} failed: {}", name, version, err);
            Vec::new()
        }
    }
}
