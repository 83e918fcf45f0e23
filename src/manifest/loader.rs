//! Load a manifest from bytes or a file: version gate, strict decode, name
//! check, data-source validation.

use crate::error::ManifestError;
use crate::manifest::types::Manifest;
use crate::manifest::validate_data_sources;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// The single manifest major version this compiler understands.
pub const SUPPORTED_MAJOR_VERSION: u64 = 2;

static VERSION_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^version: *(v\S*)").expect("Invalid version line regex"));
static SEMVER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(\d+)(?:\.\d+)?(?:\.\d+)?(?:[-+].*)?$").expect("Invalid semver regex")
});

/// Scan line by line for `version: vX.Y.Z` before any full decode, so a
/// manifest in the wrong format fails with one clear message.
pub fn check_version(data: &[u8]) -> Result<(), ManifestError> {
    for line in data.split(|b| *b == b'\n') {
        let line = String::from_utf8_lossy(line);
        let Some(caps) = VERSION_LINE_REGEX.captures(line.trim_end()) else {
            continue;
        };
        let version = &caps[1];
        let major = SEMVER_REGEX
            .captures(version)
            .and_then(|c| c[1].parse::<u64>().ok());
        if major != Some(SUPPORTED_MAJOR_VERSION) {
            return Err(ManifestError::UnsupportedVersion {
                found: version.to_string(),
            });
        }
        return Ok(());
    }
    Err(ManifestError::MissingVersion)
}

/// Parse manifest bytes. Every failure here is fatal.
pub fn parse(data: &[u8]) -> Result<Manifest, ManifestError> {
    check_version(data)?;

    let manifest: Manifest = serde_yaml::from_slice(data)?;
    if manifest.api_name_suffix.trim().is_empty() {
        return Err(ManifestError::MissingApiName);
    }

    validate_data_sources(&manifest)?;

    tracing::info!(
        api = %manifest.api_name_suffix,
        version = %manifest.version,
        objects = manifest.objects.len(),
        queries = manifest.queries.len(),
        mutations = manifest.mutations.len(),
        sources = manifest.sources.len(),
        "manifest accepted"
    );
    Ok(manifest)
}

/// Read and parse a manifest file.
pub async fn load(path: &Path) -> Result<Manifest, ManifestError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "manifest read");
    parse(&data)
}
