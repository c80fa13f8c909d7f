use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::license::classifier::RiskClassifier;

/// Root configuration structure, deserialized from `.license-radar/config.toml`.
///
/// Every section is optional; missing keys take the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub endpoints: Endpoints,
    pub maven: MavenConfig,
    pub scan: ScanConfig,
    pub risk: RiskConfig,
}

/// Settings shared by every outgoing request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout. A timed-out call is treated like an HTTP failure.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("license-radar/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the shared HTTP client.
    pub fn client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .user_agent(self.user_agent.clone())
            .build()
    }
}

/// Base URLs of every external service. Overridable for mirrors and tests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub deps_dev: String,
    pub pypi: String,
    pub npm: String,
    pub maven_central: String,
    pub github_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            deps_dev: "https://api.deps.dev/v3alpha".to_string(),
            pypi: "https://pypi.org/pypi".to_string(),
            npm: "https://registry.npmjs.org".to_string(),
            maven_central: "https://repo1.maven.org/maven2".to_string(),
            github_api: "https://api.github.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at a single base URL (used by tests against a mock server).
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            deps_dev: base.to_string(),
            pypi: base.to_string(),
            npm: base.to_string(),
            maven_central: base.to_string(),
            github_api: base.to_string(),
        }
    }
}

/// Parent POM resolution settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MavenConfig {
    /// Repositories tried in order when fetching parent POMs; first HTTP 200 wins.
    pub repositories: Vec<String>,
    /// How many ancestors to walk: 1 = parent only, 2 = parent and grandparent.
    pub parent_depth: usize,
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            repositories: vec![
                "https://repo1.maven.org/maven2".to_string(),
                "https://repo.maven.apache.org/maven2".to_string(),
            ],
            parent_depth: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of license lookups in flight at once.
    pub concurrency: usize,
    /// Folders to start discovery from. Empty means the tree root.
    pub roots: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            roots: Vec::new(),
        }
    }
}

/// Extra identifiers added to the built-in risk sets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub safe: Vec<String>,
    pub risky: Vec<String>,
    pub high_risk: Vec<String>,
}

impl RiskConfig {
    pub fn classifier(&self) -> RiskClassifier {
        RiskClassifier::with_extra(
            self.safe.iter().cloned(),
            self.high_risk.iter().cloned(),
            self.risky.iter().cloned(),
        )
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.license-radar/config.toml` (local scans only)
/// 3. `~/.config/license-radar/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: Option<&Path>, config_override: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    if let Some(project_path) = project_path {
        let project_config = project_path.join(".license-radar").join("config.toml");
        if project_config.exists() {
            return read_config(&project_config);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("license-radar")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}
