//! `license-radar`: resolve dependency licenses and flag risky ones.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config (`--config`, project, home, defaults).
//! 3. Open the source tree: a local directory, a GitHub repository through
//!    the contents API, or a downloaded zip archive (`--archive`).
//! 4. Scan: discover manifests, look up and classify every dependency.
//! 5. Render the requested report on stdout (logs go to stderr).
//! 6. Exit `0` (clean) or `1` (at least one risky or high-risk license).

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, ReportFormat};
use license_radar::config::load_config;
use license_radar::report;
use license_radar::source::{ArchiveTree, GitHubTree, LocalTree, SourceTree};
use license_radar::{Credential, Scanner};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())))
        .init();

    let local_path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());
    let project_path = cli.repo.is_none().then_some(local_path.as_path());
    let config = load_config(project_path, cli.config.as_deref()).context("failed to load config")?;
    let credential = cli.token.clone().map(Credential::new);

    // Dropped at the end of main, which removes an extracted archive.
    let tree: Box<dyn SourceTree> = match &cli.repo {
        Some(repo) => {
            let git_ref = cli.git_ref.as_deref().unwrap_or("");
            let client = config.http.client()?;
            let api = &config.endpoints.github_api;
            if cli.archive {
                Box::new(
                    ArchiveTree::download(&client, api, repo, git_ref, credential.as_ref())
                        .await
                        .with_context(|| format!("failed to download {}", repo))?,
                )
            } else {
                Box::new(GitHubTree::new(client, api, repo, git_ref, credential.clone())?)
            }
        }
        None => Box::new(LocalTree::new(local_path.clone())),
    };

    let progress = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        pb
    };

    let scanner = Scanner::new(config, credential)?.with_progress(progress);
    let scan = scanner.scan(tree.as_ref(), &cli.discovery_roots()).await?;

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&scan, &tree.describe(), cli.verbose, cli.quiet);
        }
        ReportFormat::Markdown => {
            println!("{}", report::markdown::render(&scan));
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&scan)?);
        }
    }

    if scan.risky.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
