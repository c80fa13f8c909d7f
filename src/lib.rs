//! `license-radar`: resolve dependency licenses from package registries and
//! classify them by legal risk.
//!
//! # Flow
//! 1. Discover `pom.xml`, `requirements.txt` and `package.json` files in a
//!    [`source::SourceTree`] ([`detector`]).
//! 2. Parse each manifest into coordinates ([`analyzer`]); Maven properties are
//!    resolved through the parent chain ([`analyzer::pom`]).
//! 3. Look up every dependency's license with per-ecosystem fallbacks ([`registry`]).
//! 4. Classify licenses into risk tiers ([`license`]).
//! 5. Aggregate and render ([`models::ScanReport`], [`report`]).

pub mod analyzer;
pub mod config;
pub mod detector;
pub mod error;
pub mod license;
pub mod models;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod source;

pub use config::Config;
pub use error::ScanError;
pub use models::{Credential, RiskTier, ScanEntry, ScanReport};
pub use scanner::Scanner;

use source::GitHubTree;

/// Scan a GitHub repository (`owner/name`) at `git_ref` with the default
/// configuration. Returns the risky entries and the rendered markdown report.
pub async fn scan(
    repository: &str,
    git_ref: &str,
    credential: Option<Credential>,
) -> Result<(Vec<ScanEntry>, String), ScanError> {
    scan_with_config(Config::default(), repository, git_ref, credential).await
}

/// [`scan`] with an explicit configuration (endpoints, roots, risk sets).
pub async fn scan_with_config(
    config: Config,
    repository: &str,
    git_ref: &str,
    credential: Option<Credential>,
) -> Result<(Vec<ScanEntry>, String), ScanError> {
    let tree = GitHubTree::new(
        config.http.client()?,
        &config.endpoints.github_api,
        repository,
        git_ref,
        credential.clone(),
    )?;
    let scanner = Scanner::new(config, credential)?;
    let report = scanner.scan(&tree, &[]).await?;
    let markdown = report::markdown::render(&report);
    Ok((report.risky, markdown))
}

/// Render license identifiers with risk glyphs and return the overall tier.
///
/// `["MIT OR Apache-2.0"]` gives `("MIT ✅ Safe, Apache-2.0 ✅ Safe", Safe)`;
/// an empty list gives `("❓ Unknown", Unknown)`.
pub fn classify_licenses(identifiers: &[String]) -> (String, RiskTier) {
    license::classifier::classify_licenses(identifiers)
}
