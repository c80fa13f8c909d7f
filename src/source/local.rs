use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{EntryKind, SourceTree, TreeEntry};
use crate::error::SourceError;

/// A directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalTree {
    root: PathBuf,
}

impl LocalTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, SourceError> {
        if path.split('/').any(|segment| segment == "..") {
            return Err(SourceError::NotFound(path.to_string()));
        }
        Ok(path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }
}

fn not_found_as(path: &str, err: std::io::Error) -> SourceError {
    if err.kind() == ErrorKind::NotFound {
        SourceError::NotFound(path.to_string())
    } else {
        SourceError::Io(err)
    }
}

#[async_trait]
impl SourceTree for LocalTree {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<TreeEntry>, SourceError> {
        let dir = self.resolve(path)?;
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|err| not_found_as(path, err))?;

        let mut entries = Vec::new();
        while let Some(item) = reader.next_entry().await? {
            let file_type = item.file_type().await?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };
            let name = item.file_name().to_string_lossy().into_owned();
            entries.push(TreeEntry::new(path, &name, kind));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> Result<String, SourceError> {
        let file = self.resolve(path)?;
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|err| not_found_as(path, err))
    }
}
