use serde::Deserialize;

use super::{encode_segment, RegistryClient};
use crate::error::LookupError;

/// SPDX id GitHub reports when it cannot identify a repository's license.
pub const NO_ASSERTION: &str = "NOASSERTION";

#[derive(Debug, Deserialize)]
struct RepoLicenseResponse {
    license: Option<RepoLicense>,
}

#[derive(Debug, Deserialize)]
struct RepoLicense {
    spdx_id: Option<String>,
}

/// SPDX id of a repository's detected license, if GitHub could identify one.
pub async fn repository_license(
    client: &RegistryClient,
    owner: &str,
    repo: &str,
) -> Result<Option<String>, LookupError> {
    let url = format!(
        "{}/repos/{}/{}/license",
        client.endpoints().github_api.trim_end_matches('/'),
        encode_segment(owner),
        encode_segment(repo)
    );
    let body: RepoLicenseResponse = client.get_json(&url).await?;
    Ok(body
        .license
        .and_then(|l| l.spdx_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && id != NO_ASSERTION))
}

/// Extract `(owner, repo)` from a GitHub project URL such as
/// `https://github.com/pallets/flask/` or `git+https://github.com/o/r.git`.
pub fn parse_repo_url(url: &str) -> Option<(String, String)> {
    let (_, rest) = url.split_once("github.com/")?;
    let mut segments = rest
        .split(['/', '?', '#'])
        .filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?.trim_end_matches(".git");
    if repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use reqwest::Client;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_repo_url() {
        assert_eq!(
            parse_repo_url("https://github.com/pallets/flask/"),
            Some(("pallets".to_string(), "flask".to_string()))
        );
        assert_eq!(
            parse_repo_url("git+https://github.com/psf/requests.git"),
            Some(("psf".to_string(), "requests".to_string()))
        );
        assert_eq!(
            parse_repo_url("https://github.com/encode/httpx/issues?q=1"),
            Some(("encode".to_string(), "httpx".to_string()))
        );
        assert_eq!(parse_repo_url("https://github.com/lonely"), None);
        assert_eq!(parse_repo_url("https://gitlab.com/a/b"), None);
    }

    #[tokio::test]
    async fn test_noassertion_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/custom/license"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "license": { "key": "other", "spdx_id": "NOASSERTION" }
            })))
            .mount(&server)
            .await;
        let client = RegistryClient::new(Client::new(), Endpoints::all_at(&server.uri()));

        assert_eq!(repository_license(&client, "acme", "custom").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pallets/flask/license"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "license": { "key": "bsd-3-clause", "spdx_id": "BSD-3-Clause" }
            })))
            .mount(&server)
            .await;
        let client = RegistryClient::new(Client::new(), Endpoints::all_at(&server.uri()))
            .with_github_token(Some("s3cret".to_string()));

        assert_eq!(
            repository_license(&client, "pallets", "flask").await.unwrap(),
            Some("BSD-3-Clause".to_string())
        );
    }
}
