//! Scan orchestration: discover manifests, parse them, look up and classify
//! every dependency, then aggregate into a [`ScanReport`].

use chrono::Utc;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::analyzer::parse_manifest;
use crate::analyzer::pom::PomResolver;
use crate::config::Config;
use crate::detector::{discover_manifests, ManifestFile};
use crate::error::ScanError;
use crate::license::classifier::RiskClassifier;
use crate::models::{Coordinate, Credential, ScanEntry, ScanReport};
use crate::registry::{LicenseLookup, RegistryClient};
use crate::source::SourceTree;

pub struct Scanner {
    config: Config,
    classifier: RiskClassifier,
    resolver: PomResolver,
    lookup: LicenseLookup,
    progress: ProgressBar,
}

impl Scanner {
    pub fn new(config: Config, credential: Option<Credential>) -> Result<Self, ScanError> {
        let http = config.http.client()?;
        let resolver = PomResolver::new(
            http.clone(),
            config.maven.repositories.clone(),
            config.maven.parent_depth,
        );
        let registry = RegistryClient::new(http, config.endpoints.clone())
            .with_github_token(credential.as_ref().map(|c| c.token.clone()));

        Ok(Self {
            classifier: config.risk.classifier(),
            resolver,
            lookup: LicenseLookup::new(registry),
            progress: ProgressBar::hidden(),
            config,
        })
    }

    /// Report lookup progress on `bar`. Its length grows as manifests are parsed.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    /// Scan `tree` starting from `roots` (the configured roots when empty).
    ///
    /// Only discovery failures at a root are fatal. A manifest that cannot be
    /// read or parsed is logged and contributes nothing; a dependency whose
    /// lookups all fail is reported as Unknown.
    pub async fn scan(
        &self,
        tree: &dyn SourceTree,
        roots: &[String],
    ) -> Result<ScanReport, ScanError> {
        let roots = if roots.is_empty() {
            self.config.scan.roots.as_slice()
        } else {
            roots
        };
        info!("scanning {}", tree.describe());

        let manifests = discover_manifests(tree, roots).await?;
        info!("discovered {} manifest file(s)", manifests.len());

        let mut entries = Vec::new();
        for manifest in &manifests {
            entries.extend(self.scan_manifest(tree, manifest).await);
        }
        self.progress.finish_and_clear();

        let report = ScanReport::aggregate(entries, Utc::now());
        info!(
            "scanned {} dependencies, {} risky",
            report.total(),
            report.risky.len()
        );
        Ok(report)
    }

    async fn scan_manifest(&self, tree: &dyn SourceTree, manifest: &ManifestFile) -> Vec<ScanEntry> {
        let content = match tree.read_file(&manifest.path).await {
            Ok(content) => content,
            Err(err) => {
                warn!("skipping {}: {}", manifest.path, err);
                return Vec::new();
            }
        };
        let coordinates = match parse_manifest(manifest.ecosystem, &content, &self.resolver).await {
            Ok(coordinates) => coordinates,
            Err(err) => {
                warn!("skipping {}: {}", manifest.path, err);
                return Vec::new();
            }
        };
        info!("{}: {} dependencies", manifest.path, coordinates.len());
        self.progress.inc_length(coordinates.len() as u64);

        // `buffered` keeps declaration order.
        stream::iter(coordinates)
            .map(|coordinate| self.resolve_entry(&manifest.path, coordinate))
            .buffered(self.config.scan.concurrency.max(1))
            .collect()
            .await
    }

    async fn resolve_entry(&self, file_path: &str, coordinate: Coordinate) -> ScanEntry {
        self.progress.set_message(coordinate.identity());
        let record = self.lookup.lookup(&coordinate).await;
        let (license, tier) = self.classifier.format(&record.identifiers);
        self.progress.inc(1);

        ScanEntry {
            file_path: file_path.to_string(),
            version: record
                .resolved_version
                .unwrap_or_else(|| coordinate.version.clone()),
            coordinate,
            license,
            tier,
            source: record.source,
        }
    }
}
