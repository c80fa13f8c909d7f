use semver::{Version, VersionReq};
use serde_json::Value;
use tracing::debug;

use super::deps_dev::{self, PublishedVersion};
use super::{encode_segment, RegistryClient};
use crate::error::LookupError;
use crate::models::{Coordinate, Ecosystem, LicenseRecord, LicenseSource};

/// Resolve the license of an npm package: deps.dev for the concrete version
/// the constraint selects, then the npm registry document.
pub async fn lookup(client: &RegistryClient, coordinate: &Coordinate) -> LicenseRecord {
    let name = coordinate.name.as_str();
    let constraint = coordinate.version.trim();

    let (version, resolved) = match exact_version(constraint) {
        Some(exact) => (Some(exact), None),
        None => {
            let resolved = match deps_dev::package_versions(client, Ecosystem::Npm, name).await {
                Ok(versions) => resolve_version(constraint, &versions),
                Err(err) => {
                    debug!("deps.dev version listing for {} failed: {}", name, err);
                    None
                }
            };
            (resolved.clone(), resolved)
        }
    };

    if let Some(version) = &version {
        let licenses = deps_dev::try_licenses(client, Ecosystem::Npm, name, version).await;
        if !licenses.is_empty() {
            return LicenseRecord::found(licenses, LicenseSource::DepsDev).with_resolved_version(resolved);
        }
    }

    match fetch_license(client, name, version.as_deref()).await {
        Ok(Some((license, answered))) => {
            let resolved = resolved.or_else(|| (answered != constraint).then_some(answered));
            LicenseRecord::found(vec![license], LicenseSource::Registry(Ecosystem::Npm))
                .with_resolved_version(resolved)
        }
        Ok(None) => {
            debug!("npm registry has no license for {}", name);
            LicenseRecord::unknown().with_resolved_version(resolved)
        }
        Err(err) => {
            debug!("npm registry lookup for {} failed: {}", name, err);
            LicenseRecord::unknown().with_resolved_version(resolved)
        }
    }
}

fn is_floating(constraint: &str) -> bool {
    matches!(constraint, "" | "*" | "latest" | "x" | "X")
}

/// `1.3.0`, `=1.3.0` and `v1.3.0` pin a release; anything else is a range.
fn exact_version(constraint: &str) -> Option<String> {
    let bare = constraint.trim_start_matches('=').trim_start_matches('v');
    Version::parse(bare).ok().map(|v| v.to_string())
}

/// Translate one npm comparator set into `semver` syntax: hyphen ranges
/// become `>=a, <=b` and whitespace-separated comparators are comma-joined.
fn to_version_req(set: &str) -> Option<VersionReq> {
    let set = set.trim();
    if is_floating(set) {
        return Some(VersionReq::STAR);
    }
    let translated = match set.split_once(" - ") {
        Some((low, high)) => format!(">={}, <={}", low.trim(), high.trim()),
        None => set
            .split_whitespace()
            .map(bare_comparator)
            .collect::<Vec<_>>()
            .join(", "),
    };
    VersionReq::parse(&translated).ok()
}

/// npm reads an operator-less `1.3.0` as exact and `1.3` as `1.3.x`, where
/// `semver` would read both as caret requirements.
fn bare_comparator(comparator: &str) -> String {
    let bare = comparator.strip_prefix('v').unwrap_or(comparator);
    if !bare.starts_with(|c: char| c.is_ascii_digit()) {
        return comparator.to_string();
    }
    let parts: Vec<&str> = bare.split('.').collect();
    let numeric = parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()));
    match parts.len() {
        2 if numeric => format!("~{}", bare),
        3 if numeric => format!("={}", bare),
        _ => bare.to_string(),
    }
}

/// The most recently published version satisfying an npm constraint.
/// `latest`/`*` select the newest release outright; `a || b` matches either set.
pub fn resolve_version(constraint: &str, versions: &[PublishedVersion]) -> Option<String> {
    if is_floating(constraint) {
        return deps_dev::latest(versions).map(|v| v.version.clone());
    }

    let sets: Vec<VersionReq> = constraint
        .split("||")
        .map(to_version_req)
        .collect::<Option<_>>()?;

    versions
        .iter()
        .filter(|candidate| {
            Version::parse(&candidate.version)
                .map(|v| sets.iter().any(|req| req.matches(&v)))
                .unwrap_or(false)
        })
        .max_by(|a, b| a.published.cmp(&b.published))
        .map(|v| v.version.clone())
}

/// `license` of `versions[version]` in the registry document, falling back
/// to `dist-tags.latest` when no version is known. Returns the license with
/// the version that carried it.
pub async fn fetch_license(
    client: &RegistryClient,
    name: &str,
    version: Option<&str>,
) -> Result<Option<(String, String)>, LookupError> {
    let url = format!(
        "{}/{}",
        client.endpoints().npm.trim_end_matches('/'),
        encode_segment(name)
    );
    let document: Value = client.get_json(&url).await?;

    let version = match version {
        Some(v) => v.to_string(),
        None => match document
            .get("dist-tags")
            .and_then(|tags| tags.get("latest"))
            .and_then(Value::as_str)
        {
            Some(latest) => latest.to_string(),
            None => return Ok(None),
        },
    };

    Ok(document
        .get("versions")
        .and_then(|versions| versions.get(&version))
        .and_then(license_of)
        .map(|license| (license, version)))
}

/// `license` as a string or `{ "type": ... }`, or the legacy `licenses` array.
fn license_of(manifest: &Value) -> Option<String> {
    fn name(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(obj) => obj.get("type").and_then(name),
            _ => None,
        }
    }

    if let Some(license) = manifest.get("license").and_then(name) {
        return Some(license);
    }
    let legacy: Vec<String> = manifest
        .get("licenses")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(name)
        .collect();
    (!legacy.is_empty()).then(|| legacy.join(" OR "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pv(version: &str, published: &str) -> PublishedVersion {
        PublishedVersion {
            version: version.to_string(),
            published: published.to_string(),
        }
    }

    fn history() -> Vec<PublishedVersion> {
        vec![
            pv("1.2.0", "2020-01-01T00:00:00Z"),
            pv("1.4.1", "2021-01-01T00:00:00Z"),
            pv("2.0.0", "2022-01-01T00:00:00Z"),
            pv("1.4.2", "2022-06-01T00:00:00Z"),
            pv("3.0.0-beta.1", "2023-01-01T00:00:00Z"),
        ]
    }

    #[test]
    fn test_resolve_version() {
        let versions = history();
        assert_eq!(resolve_version("^1.2.0", &versions).as_deref(), Some("1.4.2"));
        assert_eq!(resolve_version("~1.2", &versions).as_deref(), Some("1.2.0"));
        assert_eq!(resolve_version(">=2 <3", &versions).as_deref(), Some("2.0.0"));
        assert_eq!(resolve_version("1.0.0 - 1.4.1", &versions).as_deref(), Some("1.4.1"));
        assert_eq!(resolve_version("^2.0.0 || ~1.2.0", &versions).as_deref(), Some("2.0.0"));
        assert_eq!(resolve_version("latest", &versions).as_deref(), Some("3.0.0-beta.1"));
        assert_eq!(resolve_version("1.2", &versions).as_deref(), Some("1.2.0"));
        assert_eq!(resolve_version("1", &versions).as_deref(), Some("1.4.2"));
        assert_eq!(resolve_version("1.2.0 || 1.4.1", &versions).as_deref(), Some("1.4.1"));
        assert_eq!(resolve_version("^9.0.0", &versions), None);
        assert_eq!(resolve_version("github:user/repo", &versions), None);
    }

    #[test]
    fn test_exact_version() {
        assert_eq!(exact_version("1.3.0").as_deref(), Some("1.3.0"));
        assert_eq!(exact_version("=v1.3.0").as_deref(), Some("1.3.0"));
        assert_eq!(exact_version("^1.3.0"), None);
        assert_eq!(exact_version("latest"), None);
    }

    #[test]
    fn test_license_of_shapes() {
        assert_eq!(license_of(&json!({ "license": "MIT" })).as_deref(), Some("MIT"));
        assert_eq!(
            license_of(&json!({ "license": { "type": "ISC", "url": "x" } })).as_deref(),
            Some("ISC")
        );
        assert_eq!(
            license_of(&json!({ "licenses": [{ "type": "MIT" }, { "type": "Apache-2.0" }] }))
                .as_deref(),
            Some("MIT OR Apache-2.0")
        );
        assert_eq!(license_of(&json!({ "name": "x" })), None);
    }

    #[tokio::test]
    async fn test_range_resolves_through_deps_dev() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/systems/npm/packages/lodash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "versions": [
                    { "versionKey": { "version": "4.17.20" }, "publishedAt": "2020-08-13T00:00:00Z" },
                    { "versionKey": { "version": "4.17.21" }, "publishedAt": "2021-02-20T00:00:00Z" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/systems/npm/packages/lodash/versions/4.17.21"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "licenses": ["MIT"] })))
            .mount(&server)
            .await;

        let client = RegistryClient::new(Client::new(), Endpoints::all_at(&server.uri()));
        let record = lookup(&client, &Coordinate::package(Ecosystem::Npm, "lodash", "^4.17.0")).await;
        assert_eq!(record.identifiers, vec!["MIT"]);
        assert_eq!(record.source, LicenseSource::DepsDev);
        assert_eq!(record.resolved_version.as_deref(), Some("4.17.21"));
    }

    #[tokio::test]
    async fn test_registry_fallback_uses_dist_tags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/%40acme%2Fwidget"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dist-tags": { "latest": "2.1.0" },
                "versions": {
                    "2.0.0": { "license": "MIT" },
                    "2.1.0": { "license": { "type": "GPL-3.0-only" } }
                }
            })))
            .mount(&server)
            .await;

        let client = RegistryClient::new(Client::new(), Endpoints::all_at(&server.uri()));
        let record = lookup(&client, &Coordinate::package(Ecosystem::Npm, "@acme/widget", "latest")).await;
        assert_eq!(record.identifiers, vec!["GPL-3.0-only"]);
        assert_eq!(record.source, LicenseSource::Registry(Ecosystem::Npm));
        assert_eq!(record.resolved_version.as_deref(), Some("2.1.0"));

        let pinned = lookup(&client, &Coordinate::package(Ecosystem::Npm, "@acme/widget", "2.0.0")).await;
        assert_eq!(pinned.identifiers, vec!["MIT"]);
        assert_eq!(pinned.resolved_version, None);
    }
}
