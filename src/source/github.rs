use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::{EntryKind, SourceTree, TreeEntry};
use crate::error::SourceError;
use crate::models::Credential;
use crate::registry::encode_segment;

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

/// A GitHub repository at a ref, read through the REST contents API.
#[derive(Debug, Clone)]
pub struct GitHubTree {
    client: Client,
    api: String,
    owner: String,
    repo: String,
    git_ref: String,
    credential: Option<Credential>,
}

/// Split `owner/name` into its parts.
pub fn parse_repository(repository: &str) -> Result<(String, String), SourceError> {
    match repository.trim().trim_matches('/').split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.trim_end_matches(".git").to_string()))
        }
        _ => Err(SourceError::InvalidRepository(repository.to_string())),
    }
}

pub(crate) fn describe_ref(owner: &str, repo: &str, git_ref: &str) -> String {
    if git_ref.is_empty() {
        format!("{}/{}", owner, repo)
    } else {
        format!("{}/{}@{}", owner, repo, git_ref)
    }
}

/// Send an authenticated GET to the GitHub API, mapping failures onto [`SourceError`].
pub(crate) async fn authorized_get(
    client: &Client,
    url: &str,
    accept: &str,
    credential: Option<&Credential>,
    path: &str,
) -> Result<Response, SourceError> {
    let mut request = client.get(url).header(ACCEPT, accept);
    if let Some(credential) = credential {
        if credential.is_expired(Utc::now()) {
            return Err(SourceError::CredentialExpired);
        }
        request = request.header(AUTHORIZATION, format!("Bearer {}", credential.token));
    }

    let response = request.send().await?;
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(SourceError::NotFound(path.to_string())),
        status => Err(SourceError::Status {
            path: path.to_string(),
            status: status.as_u16(),
        }),
    }
}

impl GitHubTree {
    pub fn new(
        client: Client,
        api: &str,
        repository: &str,
        git_ref: &str,
        credential: Option<Credential>,
    ) -> Result<Self, SourceError> {
        let (owner, repo) = parse_repository(repository)?;
        Ok(Self {
            client,
            api: api.trim_end_matches('/').to_string(),
            owner,
            repo,
            git_ref: git_ref.to_string(),
            credential,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(encode_segment)
            .collect();
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api,
            self.owner,
            self.repo,
            encoded.join("/")
        );
        // An empty ref means the default branch.
        if self.git_ref.is_empty() {
            url
        } else {
            format!("{}?ref={}", url, encode_segment(&self.git_ref))
        }
    }
}

#[async_trait]
impl SourceTree for GitHubTree {
    fn describe(&self) -> String {
        describe_ref(&self.owner, &self.repo, &self.git_ref)
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<TreeEntry>, SourceError> {
        let url = self.contents_url(path);
        let body = authorized_get(
            &self.client,
            &url,
            JSON_MEDIA_TYPE,
            self.credential.as_ref(),
            path,
        )
        .await?
        .text()
        .await?;

        // A file path answers with an object instead of an array.
        let items: Vec<ContentItem> =
            serde_json::from_str(&body).map_err(|err| SourceError::Malformed {
                path: path.to_string(),
                message: err.to_string(),
            })?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let kind = match item.kind.as_str() {
                    "dir" => EntryKind::Dir,
                    "file" => EntryKind::File,
                    _ => return None,
                };
                Some(TreeEntry::new(path, &item.name, kind))
            })
            .collect())
    }

    async fn read_file(&self, path: &str) -> Result<String, SourceError> {
        let url = self.contents_url(path);
        let response = authorized_get(
            &self.client,
            &url,
            RAW_MEDIA_TYPE,
            self.credential.as_ref(),
            path,
        )
        .await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_repository() {
        assert_eq!(
            parse_repository("acme/shop").unwrap(),
            ("acme".to_string(), "shop".to_string())
        );
        assert_eq!(
            parse_repository("acme/shop.git").unwrap(),
            ("acme".to_string(), "shop".to_string())
        );
        assert!(parse_repository("acme").is_err());
        assert!(parse_repository("a/b/c").is_err());
    }

    #[tokio::test]
    async fn test_list_and_read_at_ref() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/shop/contents/"))
            .and(query_param("ref", "main"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "pom.xml", "path": "pom.xml", "type": "file" },
                { "name": "web", "path": "web", "type": "dir" },
                { "name": "vendored", "path": "vendored", "type": "submodule" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/shop/contents/pom.xml"))
            .and(header("accept", RAW_MEDIA_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_string("<project/>"))
            .mount(&server)
            .await;

        let tree = GitHubTree::new(
            Client::new(),
            &server.uri(),
            "acme/shop",
            "main",
            Some(Credential::new("tok")),
        )
        .unwrap();

        let root = tree.list_dir("").await.unwrap();
        assert_eq!(
            root,
            vec![
                TreeEntry::new("", "pom.xml", EntryKind::File),
                TreeEntry::new("", "web", EntryKind::Dir),
            ]
        );
        assert_eq!(tree.read_file("pom.xml").await.unwrap(), "<project/>");
        assert!(matches!(
            tree.list_dir("missing").await,
            Err(SourceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_credential_is_refused() {
        let tree = GitHubTree::new(
            Client::new(),
            "http://127.0.0.1:9",
            "acme/shop",
            "main",
            Some(Credential::new("tok").expiring_at(Utc::now() - chrono::Duration::seconds(1))),
        )
        .unwrap();
        assert!(matches!(
            tree.list_dir("").await,
            Err(SourceError::CredentialExpired)
        ));
    }
}
