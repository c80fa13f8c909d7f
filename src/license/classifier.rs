use std::collections::HashSet;

use crate::license::spdx::{base_license, normalize, split_expression, HIGH_RISK, RISKY, SAFE};
use crate::models::RiskTier;

/// Classifies license identifiers against the built-in Safe / HighRisk / Risky
/// sets, optionally extended with extra identifiers from configuration.
#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    extra_safe: HashSet<String>,
    extra_high_risk: HashSet<String>,
    extra_risky: HashSet<String>,
}

impl RiskClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add identifiers on top of the built-in sets.
    pub fn with_extra(
        safe: impl IntoIterator<Item = String>,
        high_risk: impl IntoIterator<Item = String>,
        risky: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            extra_safe: trimmed(safe),
            extra_high_risk: trimmed(high_risk),
            extra_risky: trimmed(risky),
        }
    }

    /// Classify a single (non-compound) license identifier.
    ///
    /// Exact match after trimming, alias normalization and dropping a `WITH`
    /// exception clause. Sets are checked Safe, then HighRisk, then Risky.
    pub fn classify(&self, identifier: &str) -> RiskTier {
        let trimmed = base_license(identifier.trim());
        if trimmed.is_empty() {
            return RiskTier::Unknown;
        }
        let normalized = normalize(trimmed);
        let id = normalized.as_str();

        if SAFE.contains(&id) || self.extra_safe.contains(id) {
            RiskTier::Safe
        } else if HIGH_RISK.contains(&id) || self.extra_high_risk.contains(id) {
            RiskTier::HighRisk
        } else if RISKY.contains(&id) || self.extra_risky.contains(id) {
            RiskTier::Risky
        } else {
            RiskTier::Unknown
        }
    }

    /// Render identifiers with their risk glyphs and compute the overall tier.
    ///
    /// Compound expressions are split into parts, each classified on its own.
    /// The overall tier is the most severe part, so one HighRisk component
    /// makes the whole dependency HighRisk. Empty input is Unknown.
    pub fn format(&self, identifiers: &[String]) -> (String, RiskTier) {
        let mut rendered = Vec::new();
        let mut overall: Option<RiskTier> = None;

        for identifier in identifiers {
            for part in split_expression(identifier) {
                let tier = self.classify(&part);
                rendered.push(format!("{} {}", part, tier.glyph()));
                overall = Some(overall.map_or(tier, |current| current.min(tier)));
            }
        }

        match overall {
            Some(tier) => (rendered.join(", "), tier),
            None => (RiskTier::Unknown.glyph().to_string(), RiskTier::Unknown),
        }
    }
}

fn trimmed(ids: impl IntoIterator<Item = String>) -> HashSet<String> {
    ids.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Classify a single identifier with the built-in sets.
pub fn classify(identifier: &str) -> RiskTier {
    RiskClassifier::new().classify(identifier)
}

/// Render identifiers with the built-in sets. See [`RiskClassifier::format`].
pub fn classify_licenses(identifiers: &[String]) -> (String, RiskTier) {
    RiskClassifier::new().format(identifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_identifiers() {
        assert_eq!(classify("MIT"), RiskTier::Safe);
        assert_eq!(classify("  Apache-2.0  "), RiskTier::Safe);
        assert_eq!(classify("GPL-3.0-only"), RiskTier::HighRisk);
        assert_eq!(classify("LGPL-2.1"), RiskTier::Risky);
        assert_eq!(classify("SSPL-1.0"), RiskTier::Risky);
        assert_eq!(classify("CUSTOM-LICENSE-42"), RiskTier::Unknown);
        assert_eq!(classify(""), RiskTier::Unknown);
    }

    #[test]
    fn test_exact_match_not_substring() {
        assert_eq!(classify("MIT-ish"), RiskTier::Unknown);
        assert_eq!(classify("mit"), RiskTier::Unknown);
    }

    #[test]
    fn test_aliases_and_exceptions() {
        assert_eq!(classify("Apache License, Version 2.0"), RiskTier::Safe);
        assert_eq!(
            classify("GPL-2.0 WITH Classpath-exception-2.0"),
            RiskTier::HighRisk
        );
    }

    #[test]
    fn test_or_expression_renders_both_parts() {
        let (display, tier) = classify_licenses(&ids(&["MIT OR Apache-2.0"]));
        assert_eq!(tier, RiskTier::Safe);
        assert_eq!(display, "MIT ✅ Safe, Apache-2.0 ✅ Safe");
    }

    #[test]
    fn test_most_severe_part_wins() {
        let (display, tier) = classify_licenses(&ids(&["MIT AND GPL-3.0", "LGPL-2.1"]));
        assert_eq!(tier, RiskTier::HighRisk);
        assert_eq!(display.matches(", ").count(), 2);

        let (_, tier) = classify_licenses(&ids(&["MIT", "MPL-2.0"]));
        assert_eq!(tier, RiskTier::Risky);
    }

    #[test]
    fn test_known_beats_unknown() {
        let (display, tier) = classify_licenses(&ids(&["MIT", "Some Custom License"]));
        assert_eq!(tier, RiskTier::Safe);
        assert!(display.ends_with("Some Custom License ❓ Unknown"));
    }

    #[test]
    fn test_empty_is_unknown() {
        let (display, tier) = classify_licenses(&[]);
        assert_eq!(tier, RiskTier::Unknown);
        assert_eq!(display, "❓ Unknown");
    }

    #[test]
    fn test_overall_is_minimum_of_parts() {
        let cases: &[&[&str]] = &[
            &["MIT"],
            &["(MIT OR GPL-2.0)"],
            &["EPL-2.0 OR Foo", "BSD-3-Clause"],
            &["Foo", "Bar"],
        ];
        let classifier = RiskClassifier::new();
        for case in cases {
            let input = ids(case);
            let expected = input
                .iter()
                .flat_map(|i| split_expression(i))
                .map(|p| classifier.classify(&p))
                .min()
                .unwrap_or(RiskTier::Unknown);
            assert_eq!(classifier.format(&input).1, expected, "{case:?}");
            assert_eq!(classifier.format(&input), classifier.format(&input));
        }
    }

    #[test]
    fn test_extra_identifiers() {
        let classifier = RiskClassifier::with_extra(
            vec!["Internal-1.0".to_string()],
            vec![],
            vec![" Commons-Clause ".to_string()],
        );
        assert_eq!(classifier.classify("Internal-1.0"), RiskTier::Safe);
        assert_eq!(classifier.classify("Commons-Clause"), RiskTier::Risky);
        assert_eq!(classifier.classify("MIT"), RiskTier::Safe);
    }
}
