//! Request and response bodies of the Portainer and Docker Engine APIs.
//!
//! Field names follow the wire format (PascalCase for Portainer and Docker
//! resources, camelCase for the build progress stream).

use serde::{Deserialize, Serialize};

/// A Docker host registered in Portainer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Endpoint {
    pub id: i64,
    pub name: String,
}

/// Entry of `GET /images/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageSummary {
    pub id: String,
    /// `null` for dangling images.
    #[serde(default)]
    pub repo_tags: Option<Vec<String>>,
}

impl ImageSummary {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.repo_tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

/// Entry of `GET /containers/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,
    /// Docker reports names with a leading `/`.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub image: String,
}

impl ContainerSummary {
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.strip_prefix('/') == Some(name))
    }
}

/// Body of `POST /containers/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateContainer {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposed_ports: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_config: Option<serde_json::Value>,
}

/// Response of `POST /containers/create` as proxied by Portainer, which
/// attaches the resource control it created for the new container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedContainer {
    pub id: String,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub portainer: Option<PortainerMetadata>,
}

impl CreatedContainer {
    pub fn resource_control_id(&self) -> Option<i64> {
        self.portainer
            .as_ref()
            .and_then(|p| p.resource_control.as_ref())
            .map(|rc| rc.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortainerMetadata {
    #[serde(default)]
    pub resource_control: Option<ResourceControlRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceControlRef {
    pub id: i64,
}

/// Portainer access-control team.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
}

/// Body of `PUT /resource_controls/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceControlUpdate {
    pub administrators_only: bool,
    pub public: bool,
    pub teams: Vec<i64>,
    pub users: Vec<i64>,
}

impl ResourceControlUpdate {
    /// Restricted to `teams`, no individual users, not public, not admin-only.
    /// Replaces whatever ownership the resource had before.
    pub fn team_shared(teams: Vec<i64>) -> Self {
        Self {
            administrators_only: false,
            public: false,
            teams,
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub jwt: String,
}

/// One message of the Docker build progress stream.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuildMessage {
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_detail: Option<BuildErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BuildErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by Portainer on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PortainerErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}
