use crate::models::{ScanEntry, ScanReport};

const TABLE_HEADER: [&str; 2] = [
    "| File Path | Dependency | Version | License (with Risk) | Source |",
    "|:----------|:-----------|:--------|:--------------------|:-------|",
];

const LEGEND: [&str; 5] = [
    "\n### Legend:",
    "- ✅ Safe: Permissive licenses (Apache, MIT, BSD, Zlib)",
    "- ⚠️ Risky: Weak copyleft or cloud-restricted licenses (LGPL, SSPL, Elastic, etc.)",
    "- 🔥 High Risk: Strong copyleft licenses requiring open source (GPL, AGPL)",
    "- ❓ Unknown: License not recognized",
];

fn row(entry: &ScanEntry) -> String {
    format!(
        "| `{}` | {} | {} | {} | {} |",
        entry.file_path,
        entry.coordinate.identity(),
        entry.version,
        entry.license,
        entry.source
    )
}

fn push_table<'a>(lines: &mut Vec<String>, entries: impl IntoIterator<Item = &'a ScanEntry>) {
    lines.extend(TABLE_HEADER.iter().map(|l| l.to_string()));
    lines.extend(entries.into_iter().map(row));
}

/// Render the report as markdown suitable for a pull-request comment.
///
/// Layout: title, certification banner (every entry Safe), risky table (only
/// when risky entries exist), one collapsible section per ecosystem that has
/// entries, the legend and a generation timestamp.
pub fn render(report: &ScanReport) -> String {
    let mut lines = vec!["## 📦 Dependency Scan Report".to_string()];

    if report.certified() {
        lines.push(
            "\n📜🏆 **Certified by Open Source Governance: No Risky Licenses Found!**\n".to_string(),
        );
    }

    if !report.risky.is_empty() {
        lines.push("\n### ⚠️ Risky or High-Risk Licenses Detected\n".to_string());
        push_table(&mut lines, &report.risky);
    }

    lines.push("\n*Expand below to view the full list of all scanned dependencies:*".to_string());

    for section in &report.sections {
        lines.push(format!(
            "\n<details><summary>### {}</summary>\n\n",
            section.ecosystem.section_title()
        ));
        push_table(&mut lines, &section.entries);
        lines.push("\n</details>".to_string());
    }

    lines.extend(LEGEND.iter().map(|l| l.to_string()));
    lines.push(format!(
        "\n---\n_Last updated: {}_",
        report.generated_at.format("%Y-%m-%d %I:%M %p UTC")
    ));

    lines.join("\n")
}
