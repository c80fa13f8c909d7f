use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The package ecosystems whose manifests the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ecosystem {
    Maven,
    PyPI,
    Npm,
}

impl Ecosystem {
    /// Every ecosystem, in report order.
    pub const ALL: [Ecosystem; 3] = [Ecosystem::Maven, Ecosystem::PyPI, Ecosystem::Npm];

    /// The manifest file name that identifies this ecosystem.
    pub fn manifest_name(self) -> &'static str {
        match self {
            Ecosystem::Maven => "pom.xml",
            Ecosystem::PyPI => "requirements.txt",
            Ecosystem::Npm => "package.json",
        }
    }

    /// Map a file name (not a path) back to its ecosystem.
    pub fn from_manifest_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.manifest_name() == name)
    }

    /// System name used in deps.dev URLs.
    pub fn deps_dev_system(self) -> &'static str {
        match self {
            Ecosystem::Maven => "maven",
            Ecosystem::PyPI => "pypi",
            Ecosystem::Npm => "npm",
        }
    }

    /// Heading of this ecosystem's section in the markdown report.
    pub fn section_title(self) -> &'static str {
        match self {
            Ecosystem::Maven => "Maven (`pom.xml`)",
            Ecosystem::PyPI => "Python (`requirements.txt`)",
            Ecosystem::Npm => "ReactJS / NodeJS (`package.json`)",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ecosystem::Maven => write!(f, "Maven"),
            Ecosystem::PyPI => write!(f, "PyPI"),
            Ecosystem::Npm => write!(f, "npm"),
        }
    }
}

/// Version sentinel for Maven dependencies with no explicit or inherited version.
pub const UNKNOWN_VERSION: &str = "unknown";
/// Version sentinel for npm/PyPI dependencies without a pinned version.
pub const LATEST_VERSION: &str = "latest";

/// An ecosystem-qualified dependency identity plus its declared version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub ecosystem: Ecosystem,
    /// Maven `groupId`; `None` for npm and PyPI.
    pub group: Option<String>,
    pub name: String,
    pub version: String,
}

impl Coordinate {
    pub fn maven(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            ecosystem: Ecosystem::Maven,
            group: Some(group.to_string()),
            name: artifact.to_string(),
            version: version.to_string(),
        }
    }

    pub fn package(ecosystem: Ecosystem, name: &str, version: &str) -> Self {
        Self {
            ecosystem,
            group: None,
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// `group:artifact` for Maven, the package name otherwise.
    pub fn identity(&self) -> String {
        match &self.group {
            Some(group) => format!("{}:{}", group, self.name),
            None => self.name.clone(),
        }
    }
}

/// Where a dependency's license identifiers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseSource {
    DepsDev,
    /// The ecosystem's own registry (PyPI JSON API, npm registry).
    Registry(Ecosystem),
    MavenCentral,
    GitHub,
    Unknown,
}

impl std::fmt::Display for LicenseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseSource::DepsDev => write!(f, "deps.dev"),
            LicenseSource::Registry(Ecosystem::PyPI) => write!(f, "PyPI"),
            LicenseSource::Registry(Ecosystem::Npm) => write!(f, "NPM"),
            LicenseSource::Registry(Ecosystem::Maven) => write!(f, "Maven"),
            LicenseSource::MavenCentral => write!(f, "Maven Central"),
            LicenseSource::GitHub => write!(f, "GitHub"),
            LicenseSource::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of a license lookup. `identifiers` is empty only when no source answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub identifiers: Vec<String>,
    pub source: LicenseSource,
    /// Concrete version that answered, when the declared one had to be resolved.
    pub resolved_version: Option<String>,
}

impl LicenseRecord {
    pub fn unknown() -> Self {
        Self {
            identifiers: Vec::new(),
            source: LicenseSource::Unknown,
            resolved_version: None,
        }
    }

    /// Build a record, dropping blank and duplicate identifiers. Falls back to
    /// [`LicenseRecord::unknown`] when nothing is left.
    pub fn found(identifiers: Vec<String>, source: LicenseSource) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(identifiers.len());
        for id in identifiers {
            let id = id.trim();
            if !id.is_empty() && !unique.iter().any(|u| u == id) {
                unique.push(id.to_string());
            }
        }
        if unique.is_empty() {
            return Self::unknown();
        }
        Self {
            identifiers: unique,
            source,
            resolved_version: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn with_resolved_version(mut self, version: Option<String>) -> Self {
        self.resolved_version = version;
        self
    }
}

/// Legal risk tier. Variants are declared most severe first, so the derived
/// `Ord` sorts HighRisk before Risky before Safe before Unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    HighRisk,
    Risky,
    Safe,
    Unknown,
}

impl RiskTier {
    /// Sort weight: 1 is the most severe.
    pub fn weight(self) -> u8 {
        match self {
            RiskTier::HighRisk => 1,
            RiskTier::Risky => 2,
            RiskTier::Safe => 3,
            RiskTier::Unknown => 4,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            RiskTier::HighRisk => "🔥 High Risk",
            RiskTier::Risky => "⚠️ Risky",
            RiskTier::Safe => "✅ Safe",
            RiskTier::Unknown => "❓ Unknown",
        }
    }

    /// HighRisk and Risky entries are surfaced in the risky list.
    pub fn is_risky(self) -> bool {
        matches!(self, RiskTier::HighRisk | RiskTier::Risky)
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::HighRisk => write!(f, "High Risk"),
            RiskTier::Risky => write!(f, "Risky"),
            RiskTier::Safe => write!(f, "Safe"),
            RiskTier::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One scanned dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub file_path: String,
    pub coordinate: Coordinate,
    pub version: String,
    pub license: String,
    pub tier: RiskTier,
    pub source: LicenseSource,
}

/// Entries of one ecosystem, sorted most severe first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcosystemSection {
    pub ecosystem: Ecosystem,
    pub entries: Vec<ScanEntry>,
}

/// Aggregated result of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub sections: Vec<EcosystemSection>,
    pub risky: Vec<ScanEntry>,
    pub generated_at: DateTime<Utc>,
}

impl ScanReport {
    /// Partition entries by ecosystem and derive the risky list. Every list is
    /// stably sorted by risk weight, so discovery order survives within a tier.
    pub fn aggregate(entries: Vec<ScanEntry>, generated_at: DateTime<Utc>) -> Self {
        let mut risky: Vec<ScanEntry> = entries
            .iter()
            .filter(|e| e.tier.is_risky())
            .cloned()
            .collect();
        sort_by_risk(&mut risky);

        let mut sections = Vec::new();
        for ecosystem in Ecosystem::ALL {
            let mut section: Vec<ScanEntry> = entries
                .iter()
                .filter(|e| e.coordinate.ecosystem == ecosystem)
                .cloned()
                .collect();
            if section.is_empty() {
                continue;
            }
            sort_by_risk(&mut section);
            sections.push(EcosystemSection {
                ecosystem,
                entries: section,
            });
        }

        Self {
            sections,
            risky,
            generated_at,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ScanEntry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }

    pub fn total(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    /// True when every entry across all ecosystems is Safe (vacuously true for
    /// a scan that found no dependencies).
    pub fn certified(&self) -> bool {
        self.entries().all(|e| e.tier == RiskTier::Safe)
    }
}

/// Stable sort, most severe tier first.
pub fn sort_by_risk(entries: &mut [ScanEntry]) {
    entries.sort_by_key(|e| e.tier.weight());
}

/// Access token for the source-control API, with an optional expiry.
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// A token without an expiry never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, tier: RiskTier) -> ScanEntry {
        entry_in(Ecosystem::Npm, name, tier)
    }

    fn entry_in(ecosystem: Ecosystem, name: &str, tier: RiskTier) -> ScanEntry {
        ScanEntry {
            file_path: "package.json".to_string(),
            coordinate: Coordinate::package(ecosystem, name, "1.0.0"),
            version: "1.0.0".to_string(),
            license: String::new(),
            tier,
            source: LicenseSource::DepsDev,
        }
    }

    #[test]
    fn test_sort_is_stable_by_weight() {
        let mut entries = vec![
            entry("a", RiskTier::Unknown),
            entry("b", RiskTier::Safe),
            entry("c", RiskTier::HighRisk),
            entry("d", RiskTier::Risky),
            entry("e", RiskTier::Safe),
            entry("f", RiskTier::HighRisk),
        ];
        sort_by_risk(&mut entries);
        let names: Vec<&str> = entries.iter().map(|e| e.coordinate.name.as_str()).collect();
        assert_eq!(names, vec!["c", "f", "d", "b", "e", "a"]);
    }

    #[test]
    fn test_tier_order_matches_weight() {
        assert!(RiskTier::HighRisk < RiskTier::Risky);
        assert!(RiskTier::Safe < RiskTier::Unknown);
        assert_eq!(RiskTier::HighRisk.weight(), 1);
        assert_eq!(RiskTier::Unknown.weight(), 4);
    }

    #[test]
    fn test_aggregate_partitions_and_certifies() {
        let all_safe = ScanReport::aggregate(
            vec![
                entry_in(Ecosystem::Maven, "m", RiskTier::Safe),
                entry_in(Ecosystem::Npm, "n", RiskTier::Safe),
            ],
            Utc::now(),
        );
        assert!(all_safe.certified());
        assert!(all_safe.risky.is_empty());
        assert_eq!(all_safe.sections.len(), 2);
        assert_eq!(all_safe.sections[0].ecosystem, Ecosystem::Maven);

        let one_risky = ScanReport::aggregate(
            vec![
                entry_in(Ecosystem::PyPI, "p", RiskTier::Safe),
                entry_in(Ecosystem::PyPI, "q", RiskTier::Risky),
            ],
            Utc::now(),
        );
        assert!(!one_risky.certified());
        assert_eq!(one_risky.risky.len(), 1);
        assert_eq!(one_risky.risky[0].coordinate.name, "q");
        assert_eq!(one_risky.sections[0].entries[0].coordinate.name, "q");
    }

    #[test]
    fn test_unknown_entry_breaks_certification() {
        let report = ScanReport::aggregate(
            vec![
                entry("a", RiskTier::Safe),
                entry("b", RiskTier::Unknown),
            ],
            Utc::now(),
        );
        assert!(!report.certified());
        assert!(report.risky.is_empty());
    }

    #[test]
    fn test_license_record_dedups_and_falls_back() {
        let record = LicenseRecord::found(
            vec!["MIT".into(), " MIT ".into(), "".into(), "Apache-2.0".into()],
            LicenseSource::DepsDev,
        );
        assert_eq!(record.identifiers, vec!["MIT", "Apache-2.0"]);

        let empty = LicenseRecord::found(vec!["  ".into()], LicenseSource::DepsDev);
        assert_eq!(empty, LicenseRecord::unknown());
    }

    #[test]
    fn test_ecosystem_manifest_names() {
        assert_eq!(Ecosystem::from_manifest_name("pom.xml"), Some(Ecosystem::Maven));
        assert_eq!(
            Ecosystem::from_manifest_name("requirements.txt"),
            Some(Ecosystem::PyPI)
        );
        assert_eq!(Ecosystem::from_manifest_name("package-lock.json"), None);
    }

    #[test]
    fn test_credential_expiry() {
        let now = Utc::now();
        assert!(!Credential::new("t").is_expired(now));
        let expired = Credential::new("t").expiring_at(now - chrono::Duration::minutes(1));
        assert!(expired.is_expired(now));
        let fresh = Credential::new("t").expiring_at(now + chrono::Duration::hours(1));
        assert!(!fresh.is_expired(now));
        assert!(!format!("{:?}", fresh).contains("\"t\""));
    }
}
