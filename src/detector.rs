use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::error::ScanError;
use crate::models::Ecosystem;
use crate::source::{normalize, EntryKind, SourceTree};

/// Directories never descended into.
const SKIPPED_DIRS: [&str; 2] = ["node_modules", ".git"];

/// A manifest found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    pub path: String,
    pub ecosystem: Ecosystem,
}

/// Discovery roots for a change set: the repository root plus the top-level
/// folder of every changed file, first-seen order, without duplicates.
///
/// `["api/src/app.py", "README.md", "api/pom.xml", "web/package.json"]`
/// gives `["", "api", "web"]`.
pub fn roots_for_changed_files(paths: &[String]) -> Vec<String> {
    let mut roots = vec![String::new()];
    for path in paths {
        let path = normalize(path);
        let Some((top, _)) = path.split_once('/') else {
            continue;
        };
        if !roots.iter().any(|r| r == top) {
            roots.push(top.to_string());
        }
    }
    roots
}

/// Breadth-first walk from each root collecting `pom.xml`, `requirements.txt`
/// and `package.json` files. Every directory is expanded and every file
/// reported at most once, even when roots overlap.
///
/// A root that cannot be listed aborts discovery; a nested directory that
/// cannot be listed is logged and skipped. An empty `roots` means the tree root.
pub async fn discover_manifests(
    tree: &dyn SourceTree,
    roots: &[String],
) -> Result<Vec<ManifestFile>, ScanError> {
    let mut visited_dirs: HashSet<String> = HashSet::new();
    let mut seen_files: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, bool)> = VecDeque::new();

    let roots: Vec<String> = if roots.is_empty() {
        vec![String::new()]
    } else {
        roots.iter().map(|r| normalize(r)).collect()
    };
    for root in roots {
        if visited_dirs.insert(root.clone()) {
            queue.push_back((root, true));
        }
    }

    let mut manifests = Vec::new();
    while let Some((dir, is_root)) = queue.pop_front() {
        let listing = match tree.list_dir(&dir).await {
            Ok(listing) => listing,
            Err(source) if is_root => {
                return Err(ScanError::Discovery { root: dir, source });
            }
            Err(err) => {
                warn!("skipping directory '{}': {}", dir, err);
                continue;
            }
        };

        for entry in listing {
            match entry.kind {
                EntryKind::Dir => {
                    if SKIPPED_DIRS.contains(&entry.name.as_str()) {
                        continue;
                    }
                    if visited_dirs.insert(entry.path.clone()) {
                        queue.push_back((entry.path, false));
                    }
                }
                EntryKind::File => {
                    let Some(ecosystem) = Ecosystem::from_manifest_name(&entry.name) else {
                        continue;
                    };
                    if seen_files.insert(entry.path.clone()) {
                        debug!("found {} manifest {}", ecosystem, entry.path);
                        manifests.push(ManifestFile {
                            path: entry.path,
                            ecosystem,
                        });
                    }
                }
            }
        }
    }

    Ok(manifests)
}
