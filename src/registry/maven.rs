use tracing::debug;

use super::{deps_dev, RegistryClient};
use crate::analyzer::pom::{parse_pom, pom_url};
use crate::error::LookupError;
use crate::models::{Coordinate, Ecosystem, LicenseRecord, LicenseSource, UNKNOWN_VERSION};

/// Resolve the license of a Maven artifact: deps.dev first, then the
/// `<licenses>` block of the artifact's own POM on Maven Central.
pub async fn lookup(client: &RegistryClient, coordinate: &Coordinate) -> LicenseRecord {
    let Some(group) = coordinate.group.as_deref() else {
        return LicenseRecord::unknown();
    };
    let identity = coordinate.identity();

    let mut version = coordinate.version.clone();
    let mut resolved = None;
    if version == UNKNOWN_VERSION {
        if let Some(latest) = deps_dev::resolve_latest(client, Ecosystem::Maven, &identity).await {
            debug!("{} has no declared version, using latest {}", identity, latest);
            version = latest.clone();
            resolved = Some(latest);
        }
    }

    let licenses = deps_dev::try_licenses(client, Ecosystem::Maven, &identity, &version).await;
    if !licenses.is_empty() {
        return LicenseRecord::found(licenses, LicenseSource::DepsDev).with_resolved_version(resolved);
    }

    if version != UNKNOWN_VERSION {
        match fetch_license(client, group, &coordinate.name, &version).await {
            Ok(names) if !names.is_empty() => {
                return LicenseRecord::found(names, LicenseSource::MavenCentral)
                    .with_resolved_version(resolved);
            }
            Ok(_) => debug!("POM of {}:{} declares no licenses", identity, version),
            Err(err) => debug!("Maven Central lookup for {}:{} failed: {}", identity, version, err),
        }
    }

    LicenseRecord::unknown().with_resolved_version(resolved)
}

/// Every `<licenses>/<license>/<name>` of an artifact's POM on Maven Central.
pub async fn fetch_license(
    client: &RegistryClient,
    group_id: &str,
    artifact_id: &str,
    version: &str,
) -> Result<Vec<String>, LookupError> {
    let url = pom_url(&client.endpoints().maven_central, group_id, artifact_id, version);
    let xml = client.get_text(&url).await?;
    let pom = parse_pom(&xml).map_err(|err| LookupError::Malformed {
        url,
        message: err.to_string(),
    })?;
    Ok(pom.licenses)
}
