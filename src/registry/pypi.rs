use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use super::{deps_dev, encode_segment, github, RegistryClient};
use crate::error::LookupError;
use crate::models::{Coordinate, Ecosystem, LicenseRecord, LicenseSource};

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct PypiInfo {
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub license_expression: Option<String>,
    #[serde(default)]
    pub classifiers: Vec<String>,
    #[serde(default)]
    pub project_urls: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    pub home_page: Option<String>,
}

/// Versions that do not pin a release.
fn is_floating(version: &str) -> bool {
    matches!(version.trim(), "" | "latest" | "*" | "unknown")
}

/// Resolve the license of a PyPI package: deps.dev, then the PyPI JSON API,
/// then the GitHub repository named in the package's project URLs.
pub async fn lookup(client: &RegistryClient, coordinate: &Coordinate) -> LicenseRecord {
    let name = coordinate.name.as_str();
    let pinned = !is_floating(&coordinate.version);

    let (version, resolved) = if pinned {
        (Some(coordinate.version.clone()), None)
    } else {
        let latest = deps_dev::resolve_latest(client, Ecosystem::PyPI, name).await;
        (latest.clone(), latest)
    };

    if let Some(version) = &version {
        let licenses = deps_dev::try_licenses(client, Ecosystem::PyPI, name, version).await;
        if !licenses.is_empty() {
            return LicenseRecord::found(licenses, LicenseSource::DepsDev).with_resolved_version(resolved);
        }
    }

    let info = match fetch_info(client, name, pinned.then_some(coordinate.version.as_str())).await {
        Ok(info) => info,
        Err(err) => {
            debug!("PyPI lookup for {} failed: {}", name, err);
            return LicenseRecord::unknown().with_resolved_version(resolved);
        }
    };

    let declared = licenses_from_info(&info);
    if !declared.is_empty() {
        return LicenseRecord::found(declared, LicenseSource::Registry(Ecosystem::PyPI))
            .with_resolved_version(resolved);
    }

    if let Some((owner, repo)) = github_repository(&info) {
        match github::repository_license(client, &owner, &repo).await {
            Ok(Some(spdx)) => {
                return LicenseRecord::found(vec![spdx], LicenseSource::GitHub)
                    .with_resolved_version(resolved);
            }
            Ok(None) => debug!("GitHub has no license for {}/{}", owner, repo),
            Err(err) => debug!("GitHub license lookup for {}/{} failed: {}", owner, repo, err),
        }
    }

    LicenseRecord::unknown().with_resolved_version(resolved)
}

/// The `info` object of `/pypi/{name}/json` (or `/pypi/{name}/{version}/json`).
pub async fn fetch_info(
    client: &RegistryClient,
    name: &str,
    version: Option<&str>,
) -> Result<PypiInfo, LookupError> {
    let base = client.endpoints().pypi.trim_end_matches('/');
    let url = match version {
        Some(v) => format!("{}/{}/{}/json", base, encode_segment(name), encode_segment(v)),
        None => format!("{}/{}/json", base, encode_segment(name)),
    };
    let body: PypiResponse = client.get_json(&url).await?;
    Ok(body.info)
}

/// License names declared in PyPI metadata, most specific field first:
/// `license_expression`, a one-line `license`, then trove classifiers.
pub fn licenses_from_info(info: &PypiInfo) -> Vec<String> {
    if let Some(expr) = info.license_expression.as_deref().map(str::trim) {
        if !expr.is_empty() {
            return vec![expr.to_string()];
        }
    }

    if let Some(license) = info.license.as_deref().map(str::trim) {
        // Some packages paste the whole license text here.
        if !license.is_empty() && !license.eq_ignore_ascii_case("UNKNOWN") && !license.contains('\n') {
            return vec![license.to_string()];
        }
    }

    info.classifiers
        .iter()
        .filter_map(|c| c.strip_prefix("License :: "))
        .filter_map(|c| c.rsplit(" :: ").next())
        .filter(|leaf| *leaf != "OSI Approved")
        .map(str::to_string)
        .collect()
}

/// The GitHub repository a package links to, from `project_urls` or `home_page`.
fn github_repository(info: &PypiInfo) -> Option<(String, String)> {
    info.project_urls
        .iter()
        .flat_map(|urls| urls.values())
        .flatten()
        .chain(info.home_page.iter())
        .find_map(|url| github::parse_repo_url(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use reqwest::Client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RegistryClient {
        RegistryClient::new(Client::new(), Endpoints::all_at(&server.uri()))
    }

    #[test]
    fn test_license_field_precedence() {
        let info = PypiInfo {
            license: Some("BSD".to_string()),
            license_expression: Some("MIT".to_string()),
            ..PypiInfo::default()
        };
        assert_eq!(licenses_from_info(&info), vec!["MIT"]);

        let info = PypiInfo {
            license: Some("UNKNOWN".to_string()),
            classifiers: vec![
                "Programming Language :: Python".to_string(),
                "License :: OSI Approved".to_string(),
                "License :: OSI Approved :: BSD License".to_string(),
            ],
            ..PypiInfo::default()
        };
        assert_eq!(licenses_from_info(&info), vec!["BSD License"]);

        let info = PypiInfo {
            license: Some("Copyright (c) 2024\n\nPermission is hereby granted".to_string()),
            ..PypiInfo::default()
        };
        assert!(licenses_from_info(&info).is_empty());
    }

    #[tokio::test]
    async fn test_pypi_answers_after_deps_dev_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flask/2.0/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "info": { "license": "BSD-3-Clause", "classifiers": [] }
            })))
            .mount(&server)
            .await;

        let record = lookup(
            &client_for(&server),
            &Coordinate::package(Ecosystem::PyPI, "flask", "2.0"),
        )
        .await;
        assert_eq!(record.identifiers, vec!["BSD-3-Clause"]);
        assert_eq!(record.source, LicenseSource::Registry(Ecosystem::PyPI));
    }

    #[tokio::test]
    async fn test_latest_goes_through_github() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/systems/pypi/packages/requests"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "versions": [
                    { "versionKey": { "version": "2.31.0" }, "publishedAt": "2023-05-22T00:00:00Z" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/requests/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "info": {
                    "license": "",
                    "classifiers": [],
                    "project_urls": {
                        "Documentation": "https://requests.readthedocs.io",
                        "Source": "https://github.com/psf/requests"
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/psf/requests/license"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "license": { "spdx_id": "Apache-2.0" }
            })))
            .mount(&server)
            .await;

        let record = lookup(
            &client_for(&server),
            &Coordinate::package(Ecosystem::PyPI, "requests", "latest"),
        )
        .await;
        assert_eq!(record.identifiers, vec!["Apache-2.0"]);
        assert_eq!(record.source, LicenseSource::GitHub);
        assert_eq!(record.resolved_version.as_deref(), Some("2.31.0"));
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_unknown() {
        let server = MockServer::start().await;
        let record = lookup(
            &client_for(&server),
            &Coordinate::package(Ecosystem::PyPI, "nothing-here", "1.0"),
        )
        .await;
        assert_eq!(record, LicenseRecord::unknown());
    }
}
