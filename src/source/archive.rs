use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use tempfile::TempDir;
use tracing::{debug, warn};

use super::github::{authorized_get, describe_ref, parse_repository};
use super::{LocalTree, SourceTree, TreeEntry};
use crate::error::SourceError;
use crate::models::Credential;
use crate::registry::encode_segment;

/// A repository snapshot extracted from a zip archive into a temporary
/// directory. The directory is removed when the tree is dropped.
#[derive(Debug)]
pub struct ArchiveTree {
    label: String,
    inner: LocalTree,
    _dir: TempDir,
}

impl ArchiveTree {
    /// Download `GET /repos/{owner}/{repo}/zipball/{ref}` and extract it. An
    /// empty `git_ref` downloads the default branch.
    pub async fn download(
        client: &Client,
        api: &str,
        repository: &str,
        git_ref: &str,
        credential: Option<&Credential>,
    ) -> Result<Self, SourceError> {
        let (owner, repo) = parse_repository(repository)?;
        let mut url = format!("{}/repos/{}/{}/zipball", api.trim_end_matches('/'), owner, repo);
        if !git_ref.is_empty() {
            url = format!("{}/{}", url, encode_segment(git_ref));
        }
        let bytes = authorized_get(client, &url, "application/vnd.github+json", credential, repository)
            .await?
            .bytes()
            .await?;
        debug!("downloaded {} bytes from {}", bytes.len(), url);

        let label = describe_ref(&owner, &repo, git_ref);
        tokio::task::spawn_blocking(move || Self::from_zip_bytes(&bytes, label))
            .await
            .map_err(|err| SourceError::Archive(err.to_string()))?
    }

    /// Extract an in-memory zip. When the archive holds a single top-level
    /// directory (as GitHub zipballs do), that directory becomes the root.
    pub fn from_zip_bytes(bytes: &[u8], label: String) -> Result<Self, SourceError> {
        let dir = TempDir::new()?;
        extract(bytes, dir.path())?;
        let root = single_top_level(dir.path())?.unwrap_or_else(|| dir.path().to_path_buf());
        Ok(Self {
            label,
            inner: LocalTree::new(root),
            _dir: dir,
        })
    }
}

fn extract(bytes: &[u8], dest: &Path) -> Result<(), SourceError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // Rejects absolute paths and `..` traversal.
        let Some(relative) = entry.enclosed_name() else {
            warn!("skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out_file = fs::File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out_file)?;
        }
    }
    Ok(())
}

fn single_top_level(dir: &Path) -> Result<Option<PathBuf>, SourceError> {
    let mut children = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    if children.len() != 1 {
        return Ok(None);
    }
    let only = children.remove(0);
    Ok(only.file_type()?.is_dir().then(|| only.path()))
}

#[async_trait]
impl SourceTree for ArchiveTree {
    fn describe(&self) -> String {
        format!("{} (archive)", self.label)
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<TreeEntry>, SourceError> {
        self.inner.list_dir(path).await
    }

    async fn read_file(&self, path: &str) -> Result<String, SourceError> {
        self.inner.read_file(path).await
    }
}
