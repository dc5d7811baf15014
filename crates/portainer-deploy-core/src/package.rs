//! `package.json` discovery and image/container name resolution.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::DeployConfig;

/// Manifest file looked up in the project directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Name and version extracted from the project's `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl PackageManifest {
    /// Read `package.json` from `project_dir`. Returns `Ok(None)` when the
    /// file does not exist.
    pub fn load(project_dir: &Path) -> crate::Result<Option<Self>> {
        let path = project_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| crate::Error::ManifestLoad {
            path: path.clone(),
            source: e,
        })?;
        let manifest: Self =
            serde_json::from_str(&content).map_err(|e| crate::Error::ManifestParse {
                path: path.clone(),
                source: e,
            })?;

        tracing::debug!(
            path = %path.display(),
            name = manifest.name.as_deref().unwrap_or("-"),
            version = manifest.version.as_deref().unwrap_or("-"),
            "found package manifest",
        );
        Ok(Some(manifest))
    }
}

/// Docker image reference `name:version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag {
    pub name: String,
    pub version: String,
}

impl ImageTag {
    /// Pick the image tag for this deploy.
    ///
    /// With a manifest, `imageName` overrides the manifest name and the
    /// manifest version wins over `imageVersion`. Without one, both config
    /// keys are required. The tag format itself is not validated.
    pub fn resolve(
        config: &DeployConfig,
        manifest: Option<&PackageManifest>,
    ) -> crate::Result<Self> {
        let (name, version) = match manifest {
            Some(manifest) => (
                config.image_name.as_ref().or(manifest.name.as_ref()),
                manifest.version.as_ref().or(config.image_version.as_ref()),
            ),
            None => (config.image_name.as_ref(), config.image_version.as_ref()),
        };

        let name = name.ok_or(crate::Error::MissingImageName)?;
        let version = version.ok_or(crate::Error::MissingImageVersion)?;

        Ok(Self {
            name: name.clone(),
            version: version.clone(),
        })
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// `containerName` from the config, falling back to the manifest name.
pub fn resolve_container_name(
    config: &DeployConfig,
    manifest: Option<&PackageManifest>,
) -> crate::Result<String> {
    config
        .container_name
        .as_ref()
        .or_else(|| manifest.and_then(|m| m.name.as_ref()))
        .cloned()
        .ok_or(crate::Error::MissingContainerName)
}
