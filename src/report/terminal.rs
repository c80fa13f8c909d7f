use std::collections::HashMap;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{RiskTier, ScanEntry, ScanReport};

/// Render a colored terminal report.
///
/// Risky entries are always tabulated; `verbose` adds one table per
/// ecosystem with every entry; `quiet` prints only the summary line.
pub fn render(report: &ScanReport, target: &str, verbose: bool, quiet: bool) {
    let count = |tier: RiskTier| report.entries().filter(|e| e.tier == tier).count();
    let high = count(RiskTier::HighRisk);
    let risky = count(RiskTier::Risky);
    let safe = count(RiskTier::Safe);
    let unknown = count(RiskTier::Unknown);

    if quiet {
        println!(
            "Total: {}  Safe: {}  Risky: {}  High risk: {}  Unknown: {}",
            report.total(),
            safe.to_string().green(),
            risky.to_string().yellow(),
            high.to_string().red(),
            unknown.to_string().dimmed(),
        );
        return;
    }

    println!("\n {} v{}", "license-radar".bold(), env!("CARGO_PKG_VERSION"));
    println!(" Scanned: {}\n", target);

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total dependencies : {}", report.total()));
    for (label, n, tier) in [
        ("🔥 High risk", high, RiskTier::HighRisk),
        ("⚠️ Risky", risky, RiskTier::Risky),
        ("✅ Safe", safe, RiskTier::Safe),
        ("❓ Unknown", unknown, RiskTier::Unknown),
    ] {
        println!(
            " │  {:<48} │",
            format!("{:<14}: {:>4}  {}", label, n, top_licenses(report, tier))
        );
    }
    println!(" └────────────────────────────────────────────────────┘\n");

    if report.certified() {
        println!(" {} No risky licenses found\n", "[CERTIFIED]".green().bold());
    }

    if !report.risky.is_empty() {
        println!(" {} Dependencies requiring attention:\n", "[RISK]".red().bold());
        println!("{}\n", table(&report.risky));
    }

    if verbose {
        for section in &report.sections {
            println!(" {} {}:\n", "[ALL]".cyan().bold(), section.ecosystem.section_title());
            println!("{}\n", table(&section.entries));
        }
    }
}

fn tier_color(tier: RiskTier) -> Color {
    match tier {
        RiskTier::HighRisk => Color::Red,
        RiskTier::Risky => Color::Yellow,
        RiskTier::Safe => Color::Green,
        RiskTier::Unknown => Color::DarkGrey,
    }
}

fn table(entries: &[ScanEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Dependency").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
        ]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.file_path),
            Cell::new(entry.coordinate.identity()),
            Cell::new(&entry.version),
            Cell::new(&entry.license).fg(tier_color(entry.tier)),
            Cell::new(entry.source.to_string()),
        ]);
    }
    table
}

/// The three most common license strings within a tier, e.g. `[MIT ✅ Safe (4)]`.
fn top_licenses(report: &ScanReport, tier: RiskTier) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in report.entries().filter(|e| e.tier == tier) {
        *counts.entry(entry.license.as_str()).or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(license, n)| format!("{} ({})", license, n))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, Ecosystem, LicenseSource};
    use chrono::Utc;

    fn entry(name: &str, license: &str, tier: RiskTier) -> ScanEntry {
        ScanEntry {
            file_path: "package.json".to_string(),
            coordinate: Coordinate::package(Ecosystem::Npm, name, "1.0.0"),
            version: "1.0.0".to_string(),
            license: license.to_string(),
            tier,
            source: LicenseSource::DepsDev,
        }
    }

    #[test]
    fn test_top_licenses() {
        let report = ScanReport::aggregate(
            vec![
                entry("a", "MIT ✅ Safe", RiskTier::Safe),
                entry("b", "ISC ✅ Safe", RiskTier::Safe),
                entry("c", "MIT ✅ Safe", RiskTier::Safe),
                entry("d", "GPL-3.0 🔥 High Risk", RiskTier::HighRisk),
            ],
            Utc::now(),
        );
        assert_eq!(
            top_licenses(&report, RiskTier::Safe),
            "[MIT ✅ Safe (2), ISC ✅ Safe (1)]"
        );
        assert_eq!(top_licenses(&report, RiskTier::Risky), "");
    }

    #[test]
    fn test_table_has_a_row_per_entry() {
        let entries = vec![
            entry("a", "MIT ✅ Safe", RiskTier::Safe),
            entry("b", "❓ Unknown", RiskTier::Unknown),
        ];
        let rendered = table(&entries).to_string();
        assert!(rendered.contains("Dependency"));
        assert!(rendered.contains("❓ Unknown"));
        assert_eq!(table(&entries).row_iter().count(), 2);
    }
}
