//! Source trees the scanner can walk: a local checkout, a GitHub repository
//! through the contents API, or a downloaded zip archive of one.
//!
//! Paths are repository-relative, `/`-separated, with `""` naming the root.

use async_trait::async_trait;

use crate::error::SourceError;

pub mod archive;
pub mod github;
pub mod local;

pub use archive::ArchiveTree;
pub use github::GitHubTree;
pub use local::LocalTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn new(parent: &str, name: &str, kind: EntryKind) -> Self {
        Self {
            path: join(parent, name),
            name: name.to_string(),
            kind,
        }
    }
}

#[async_trait]
pub trait SourceTree: Send + Sync {
    /// Short description for logs and report headers.
    fn describe(&self) -> String;

    /// Immediate children of a directory. Entries that are neither files nor
    /// directories (symlinks, submodules) are left out.
    async fn list_dir(&self, path: &str) -> Result<Vec<TreeEntry>, SourceError>;

    async fn read_file(&self, path: &str) -> Result<String, SourceError>;
}

/// Canonical form of a user-supplied path: no leading `./` or `/`, no
/// trailing `/`, `.` is the root.
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
