use std::path::PathBuf;

use clap::Parser;
use license_radar::detector::roots_for_changed_files;

#[derive(Parser, Debug)]
#[command(
    name = "license-radar",
    about = "Resolve dependency licenses and flag risky ones",
    version
)]
pub struct Cli {
    /// Local project path to scan (ignored with --repo)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Scan a GitHub repository instead, as owner/name
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Branch, tag or commit to scan with --repo [default: the default branch]
    #[arg(long = "ref", value_name = "REF", requires = "repo")]
    pub git_ref: Option<String>,

    /// Download the repository as a zip archive instead of walking the contents API
    #[arg(long, requires = "repo")]
    pub archive: bool,

    /// Folder to start discovery from (repeatable) [default: repository root]
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<String>,

    /// Changed file (repeatable); scans the root plus each file's top-level folder
    #[arg(long, value_name = "FILE")]
    pub changed: Vec<String>,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Config file [default: ./.license-radar/config.toml, fallback ~/.config/license-radar/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Show every dependency and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print the summary line; no progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Markdown,
    Json,
}

impl Cli {
    /// Discovery roots: `--root` folders, plus those derived from `--changed`.
    pub fn discovery_roots(&self) -> Vec<String> {
        let mut roots = self.roots.clone();
        if !self.changed.is_empty() {
            for root in roots_for_changed_files(&self.changed) {
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        roots
    }

    /// Default log level when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}
