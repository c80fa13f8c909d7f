use regex::Regex;
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::{Coordinate, Ecosystem, LATEST_VERSION};

/// Parse `requirements.txt` content.
///
/// Handles `name`, `name==1.0` and the `>=`, `<=`, `>`, `<`, `~=` operators.
/// A bare name, or a name with any other specifier (`!=`, `===`, a direct
/// `name @ url` reference), gets version `"latest"`. Comments, blank lines and
/// pip options (`-r`, `-e`, `--index-url`) are skipped; lines without a
/// package name are logged and skipped.
pub fn parse_requirements_txt(content: &str) -> Result<Vec<Coordinate>, ParseError> {
    let re = Regex::new(
        r"^([A-Za-z0-9_\-\.]+)\s*(?:\[[^\]]*\])?\s*(?:(===|==|>=|<=|~=|!=|>|<|@)\s*(.*))?$",
    )?;
    let mut deps = Vec::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('-') {
            debug!("skipping pip option line: {}", line);
            continue;
        }

        // Drop inline comments and environment markers.
        let line = line.split(" #").next().unwrap_or(line);
        let line = line.split(';').next().unwrap_or(line).trim();

        let Some(caps) = re.captures(line) else {
            warn!("skipping unrecognized requirements line: {}", raw.trim());
            continue;
        };

        let name = &caps[1];
        // `>=2.0,<3` keeps the first clause.
        let version = caps
            .get(3)
            .map(|m| m.as_str().split(',').next().unwrap_or("").trim())
            .filter(|v| {
                let op = caps.get(2).map(|m| m.as_str());
                matches!(op, Some("==" | ">=" | "<=" | "~=" | ">" | "<")) && !v.is_empty()
            })
            .unwrap_or(LATEST_VERSION);

        deps.push(Coordinate::package(Ecosystem::PyPI, name, version));
    }

    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(deps: &[Coordinate]) -> Vec<(&str, &str)> {
        deps.iter()
            .map(|d| (d.name.as_str(), d.version.as_str()))
            .collect()
    }

    #[test]
    fn test_parse_requirements_txt() {
        let deps = parse_requirements_txt("flask==2.0\n# comment\nrequests\n").unwrap();
        assert_eq!(pairs(&deps), vec![("flask", "2.0"), ("requests", "latest")]);
    }

    #[test]
    fn test_operators_and_noise() {
        let content = r#"
# pinned
Django>=4.2,<5
numpy ~= 1.24
pandas<2 ; python_version >= '3.8'
uvicorn[standard]==0.23.2  # server
-r other.txt
--index-url https://example.org/simple
git+https://github.com/org/repo.git
flask==
urllib3!=1.25.0
pkg===1.0
mylib @ https://example.org/mylib.whl
"#;
        let deps = parse_requirements_txt(content).unwrap();
        assert_eq!(
            pairs(&deps),
            vec![
                ("Django", "4.2"),
                ("numpy", "1.24"),
                ("pandas", "2"),
                ("uvicorn", "0.23.2"),
                ("flask", "latest"),
                ("urllib3", "latest"),
                ("pkg", "latest"),
                ("mylib", "latest"),
            ]
        );
        assert!(deps.iter().all(|d| d.ecosystem == Ecosystem::PyPI));
    }

    #[test]
    fn test_empty_content() {
        assert!(parse_requirements_txt("\n\n# only comments\n").unwrap().is_empty());
    }
}
