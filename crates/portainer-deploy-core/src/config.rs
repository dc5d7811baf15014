use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Deploy configuration file (JSON).
///
/// Keys follow the camelCase names of the config file, except
/// `ExposedPorts` and `HostConfig` which are handed to the Docker Engine
/// container-create call unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// Portainer host name or address
    #[serde(default)]
    pub portainer_host: String,
    /// Portainer HTTP port (defaults to 9000)
    #[serde(default = "default_port")]
    pub portainer_port: u16,
    /// API path prefix (defaults to `api/`)
    #[serde(default = "default_base_path")]
    pub portainer_base_url: String,
    /// HTTP proxy used for every API request. `false`, `null` and `""` disable it.
    #[serde(default, deserialize_with = "deserialize_proxy")]
    pub proxy: Option<ProxyConfig>,
    /// Name of the Docker endpoint registered in Portainer (defaults to `local`)
    #[serde(default = "default_endpoint_name")]
    pub endpoint_name: String,
    /// Image name (defaults to the package.json name)
    #[serde(default)]
    pub image_name: Option<String>,
    /// Image version, used when no package.json exists
    #[serde(default)]
    pub image_version: Option<String>,
    /// Delete an existing image with the same tag (and its containers) before building
    #[serde(default)]
    pub override_old_image: bool,
    /// Top-level entries to send as build context. Takes precedence over the blacklist.
    #[serde(default)]
    pub build_ctx_whitelist: Option<Vec<String>>,
    /// Top-level entries to leave out of the build context
    #[serde(default)]
    pub build_ctx_blacklist: Option<Vec<String>>,
    /// Dockerfile path inside the build context
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
    /// Container name (defaults to the package.json name)
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(rename = "ExposedPorts", default)]
    pub exposed_ports: Option<serde_json::Value>,
    #[serde(rename = "HostConfig", default)]
    pub host_config: Option<serde_json::Value>,
}

/// Proxy settings: either a full URL or the host/port object form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProxyConfig {
    Url(String),
    Parts {
        #[serde(default)]
        protocol: Option<String>,
        host: String,
        port: u16,
        #[serde(default)]
        auth: Option<ProxyAuth>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            portainer_host: String::new(),
            portainer_port: default_port(),
            portainer_base_url: default_base_path(),
            proxy: None,
            endpoint_name: default_endpoint_name(),
            image_name: None,
            image_version: None,
            override_old_image: false,
            build_ctx_whitelist: None,
            build_ctx_blacklist: None,
            dockerfile: default_dockerfile(),
            container_name: None,
            exposed_ports: None,
            host_config: None,
        }
    }
}

impl DeployConfig {
    /// Load and validate the config file at `path`.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::ConfigLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            host = %config.portainer_host,
            endpoint = %config.endpoint_name,
            "loaded deploy config",
        );
        Ok(config)
    }

    /// Presence checks for keys without a usable default.
    pub fn validate(&self) -> crate::Result<()> {
        if self.portainer_host.trim().is_empty() {
            return Err(crate::Error::MissingField("portainerHost"));
        }
        Ok(())
    }

    /// Root URL of the Portainer API, always ending in `/`.
    pub fn base_url(&self) -> String {
        let host = self.portainer_host.trim_end_matches('/');
        let path = self.portainer_base_url.trim_matches('/');
        if path.is_empty() {
            format!("http://{host}:{port}/", port = self.portainer_port)
        } else {
            format!("http://{host}:{port}/{path}/", port = self.portainer_port)
        }
    }
}

impl ProxyConfig {
    /// Proxy URL in the form reqwest expects. Credentials from the object
    /// form are not part of it, see [`ProxyConfig::credentials`].
    pub fn url(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Parts {
                protocol,
                host,
                port,
                ..
            } => {
                let scheme = protocol
                    .as_deref()
                    .unwrap_or("http")
                    .trim_end_matches(':');
                format!("{scheme}://{host}:{port}")
            }
        }
    }

    /// Basic-auth credentials of the object form.
    pub fn credentials(&self) -> Option<&ProxyAuth> {
        match self {
            Self::Url(_) => None,
            Self::Parts { auth, .. } => auth.as_ref(),
        }
    }
}

/// Accepts the proxy object or URL, and treats `false`, `null` and an
/// empty string as "no proxy".
fn deserialize_proxy<'de, D>(deserializer: D) -> Result<Option<ProxyConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => Ok(None),
        serde_json::Value::String(ref url) if url.trim().is_empty() => Ok(None),
        serde_json::Value::Bool(true) => Err(D::Error::custom(
            "`proxy: true` is not a proxy; use a URL or an object with host and port",
        )),
        other => ProxyConfig::deserialize(other)
            .map(Some)
            .map_err(D::Error::custom),
    }
}

fn default_port() -> u16 {
    9000
}

fn default_base_path() -> String {
    "api/".to_owned()
}

fn default_endpoint_name() -> String {
    "local".to_owned()
}

fn default_dockerfile() -> String {
    "Dockerfile".to_owned()
}
