//! Manifest parsers: raw manifest text to an ordered list of [`Coordinate`]s.

use crate::error::ParseError;
use crate::models::{Coordinate, Ecosystem};

pub mod java;
pub mod node;
pub mod pom;
pub mod python;

use pom::PomResolver;

/// Parse one manifest with the parser of its ecosystem. Maven manifests have
/// their properties resolved (including parent POMs) before this returns.
pub async fn parse_manifest(
    ecosystem: Ecosystem,
    content: &str,
    resolver: &PomResolver,
) -> Result<Vec<Coordinate>, ParseError> {
    match ecosystem {
        Ecosystem::Maven => java::parse_pom_xml(content, resolver).await,
        Ecosystem::PyPI => python::parse_requirements_txt(content),
        Ecosystem::Npm => node::parse_package_json(content),
    }
}
