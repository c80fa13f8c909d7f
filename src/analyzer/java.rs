use tracing::debug;

use crate::analyzer::pom::{parse_pom, Pom, PomResolver, PropertyTable};
use crate::error::ParseError;
use crate::models::{Coordinate, UNKNOWN_VERSION};

/// Parse `pom.xml` content into Maven coordinates.
///
/// The property table (own properties plus parent and grandparent) is built
/// before any coordinate is finalized, so `${...}` in `groupId`, `artifactId`
/// and `version` resolve against inherited values.
pub async fn parse_pom_xml(
    content: &str,
    resolver: &PomResolver,
) -> Result<Vec<Coordinate>, ParseError> {
    let pom = parse_pom(content)?;
    let table = resolver.property_table(&pom).await;
    debug!(
        "pom {} has {} dependencies, {} properties after inheritance",
        pom.artifact_id.as_deref().unwrap_or("?"),
        pom.dependencies.len(),
        table.len()
    );
    Ok(resolve_dependencies(&pom, &table))
}

/// Finalize dependency coordinates against a merged property table.
///
/// A dependency without `<version>` takes the inherited `project.version`,
/// or `"unknown"` when there is none.
pub fn resolve_dependencies(pom: &Pom, table: &PropertyTable) -> Vec<Coordinate> {
    let inherited_version = table
        .get("project.version")
        .map(|v| table.resolve(v));

    pom.dependencies
        .iter()
        .filter_map(|dep| {
            let group_id = table.resolve(dep.group_id.as_deref()?);
            let artifact_id = table.resolve(dep.artifact_id.as_deref()?);
            let version = match &dep.version {
                Some(version) => table.resolve(version),
                None => inherited_version
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            };
            Some(Coordinate::maven(&group_id, &artifact_id, &version))
        })
        .collect()
}
