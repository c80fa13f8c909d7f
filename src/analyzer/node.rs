use serde_json::Value;

use crate::error::ParseError;
use crate::models::{Coordinate, Ecosystem, LATEST_VERSION};

/// Parse `package.json` content: `dependencies` then `devDependencies`.
///
/// Version ranges are passed through verbatim; resolving them is the npm
/// license adapter's job. Entries keep their order in the file.
pub fn parse_package_json(content: &str) -> Result<Vec<Coordinate>, ParseError> {
    let json: Value = serde_json::from_str(content)?;
    if !json.is_object() {
        return Err(ParseError::NotAnObject);
    }
    let mut deps = Vec::new();

    for section in &["dependencies", "devDependencies"] {
        if let Some(pkgs) = json.get(section).and_then(|v| v.as_object()) {
            for (name, version_range) in pkgs {
                let version = version_range.as_str().unwrap_or(LATEST_VERSION);
                deps.push(Coordinate::package(Ecosystem::Npm, name, version));
            }
        }
    }

    Ok(deps)
}
