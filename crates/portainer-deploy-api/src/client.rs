use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::TransportError;
use crate::models::{
    BuildMessage, ContainerSummary, CreateContainer, CreatedContainer, Endpoint, ImageSummary,
    LoginRequest, LoginResponse, PortainerErrorBody, ResourceControlUpdate, Team,
};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport};
use portainer_deploy_core::DeployConfig;

/// Portainer login.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Token returned by `POST auth`, valid for the rest of the run.
#[derive(Debug)]
pub struct Session {
    token: SecretString,
}

impl Session {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    fn authorize(&self, request: ApiRequest) -> ApiRequest {
        request.bearer(self.token.expose_secret())
    }
}

/// Portainer API client, parameterized over the transport for testability.
pub struct PortainerClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
}

impl PortainerClient<ReqwestTransport> {
    pub fn from_config(config: &DeployConfig) -> Result<Self, ApiError> {
        Ok(Self {
            transport: ReqwestTransport::new(config)?,
        })
    }
}

impl<T: HttpTransport> PortainerClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    // ── Auth ──

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let body = encode(
            "auth",
            &LoginRequest {
                username: &credentials.username,
                password: credentials.password.expose_secret(),
            },
        )?;
        let response: LoginResponse = self
            .call_json(ApiRequest::new(Method::Post, "auth").json(body))
            .await?;

        tracing::debug!(username = %credentials.username, "logged into portainer");
        Ok(Session::new(SecretString::from(response.jwt)))
    }

    // ── Endpoints ──

    pub async fn list_endpoints(&self, session: &Session) -> Result<Vec<Endpoint>, ApiError> {
        self.call_json(session.authorize(ApiRequest::new(Method::Get, "endpoints")))
            .await
    }

    /// Endpoint whose name equals `name` exactly.
    pub async fn find_endpoint(&self, session: &Session, name: &str) -> Result<Endpoint, ApiError> {
        let endpoints = self.list_endpoints(session).await?;
        let available: Vec<String> = endpoints.iter().map(|e| e.name.clone()).collect();

        endpoints
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| ApiError::EndpointNotFound {
                name: name.to_owned(),
                available,
            })
    }

    // ── Images ──

    pub async fn list_images(
        &self,
        session: &Session,
        endpoint_id: i64,
    ) -> Result<Vec<ImageSummary>, ApiError> {
        let path = docker_path(endpoint_id, "images/json");
        self.call_json(session.authorize(ApiRequest::new(Method::Get, path)))
            .await
    }

    pub async fn find_image_by_tag(
        &self,
        session: &Session,
        endpoint_id: i64,
        tag: &str,
    ) -> Result<Option<ImageSummary>, ApiError> {
        let images = self.list_images(session, endpoint_id).await?;
        Ok(images.into_iter().find(|image| image.has_tag(tag)))
    }

    pub async fn delete_image(
        &self,
        session: &Session,
        endpoint_id: i64,
        tag: &str,
    ) -> Result<(), ApiError> {
        let path = docker_path(endpoint_id, &format!("images/{tag}"));
        self.call(session.authorize(ApiRequest::new(Method::Delete, path)))
            .await?;
        Ok(())
    }

    /// Upload a build context and build it as `tag`.
    ///
    /// Docker answers 200 and reports build failures inside the progress
    /// stream, so the stream is scanned for error messages.
    pub async fn build_image(
        &self,
        session: &Session,
        endpoint_id: i64,
        dockerfile: &str,
        tag: &str,
        archive: Vec<u8>,
    ) -> Result<(), ApiError> {
        let path = docker_path(endpoint_id, "build");
        let request = ApiRequest::new(Method::Post, path.clone())
            .query("dockerfile", dockerfile)
            .query("t", tag)
            .tar(archive);

        let response = self.call(session.authorize(request)).await?;
        check_build_stream(&path, tag, &response.body)
    }

    // ── Containers ──

    /// All containers, including stopped ones.
    pub async fn list_containers(
        &self,
        session: &Session,
        endpoint_id: i64,
    ) -> Result<Vec<ContainerSummary>, ApiError> {
        let path = docker_path(endpoint_id, "containers/json");
        self.call_json(session.authorize(ApiRequest::new(Method::Get, path).query("all", "1")))
            .await
    }

    pub async fn containers_using_image(
        &self,
        session: &Session,
        endpoint_id: i64,
        tag: &str,
    ) -> Result<Vec<ContainerSummary>, ApiError> {
        let containers = self.list_containers(session, endpoint_id).await?;
        Ok(containers.into_iter().filter(|c| c.image == tag).collect())
    }

    pub async fn find_container_by_name(
        &self,
        session: &Session,
        endpoint_id: i64,
        name: &str,
    ) -> Result<Option<ContainerSummary>, ApiError> {
        let containers = self.list_containers(session, endpoint_id).await?;
        Ok(containers.into_iter().find(|c| c.has_name(name)))
    }

    /// Force-remove a container together with its anonymous volumes.
    pub async fn delete_container(
        &self,
        session: &Session,
        endpoint_id: i64,
        container_id: &str,
    ) -> Result<(), ApiError> {
        let path = docker_path(endpoint_id, &format!("containers/{container_id}"));
        let request = ApiRequest::new(Method::Delete, path)
            .query("force", "true")
            .query("v", "1");
        self.call(session.authorize(request)).await?;
        Ok(())
    }

    pub async fn create_container(
        &self,
        session: &Session,
        endpoint_id: i64,
        name: &str,
        spec: &CreateContainer,
    ) -> Result<CreatedContainer, ApiError> {
        let path = docker_path(endpoint_id, "containers/create");
        let body = encode(&path, spec)?;
        let request = ApiRequest::new(Method::Post, path)
            .query("name", name)
            .json(body);
        self.call_json(session.authorize(request)).await
    }

    pub async fn start_container(
        &self,
        session: &Session,
        endpoint_id: i64,
        container_id: &str,
    ) -> Result<(), ApiError> {
        let path = docker_path(endpoint_id, &format!("containers/{container_id}/start"));
        self.call(session.authorize(ApiRequest::new(Method::Post, path)))
            .await?;
        Ok(())
    }

    // ── Access control ──

    pub async fn list_teams(&self, session: &Session) -> Result<Vec<Team>, ApiError> {
        self.call_json(session.authorize(ApiRequest::new(Method::Get, "teams")))
            .await
    }

    pub async fn update_resource_control(
        &self,
        session: &Session,
        resource_control_id: i64,
        update: &ResourceControlUpdate,
    ) -> Result<(), ApiError> {
        let path = format!("resource_controls/{resource_control_id}");
        let body = encode(&path, update)?;
        self.call(session.authorize(ApiRequest::new(Method::Put, path).json(body)))
            .await?;
        Ok(())
    }

    // ── Plumbing ──

    async fn call(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        tracing::debug!(%method, %path, "portainer request");

        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(method, path, &response))
        }
    }

    async fn call_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let path = request.path.clone();
        let response = self.call(request).await?;
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode { path, source: e })
    }
}

// ── Helpers ──

fn docker_path(endpoint_id: i64, rest: &str) -> String {
    format!("endpoints/{endpoint_id}/docker/{rest}")
}

fn encode<B: Serialize>(path: &str, body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode {
        path: path.to_owned(),
        source: e,
    })
}

fn check_build_stream(path: &str, tag: &str, body: &[u8]) -> Result<(), ApiError> {
    let messages = serde_json::Deserializer::from_slice(body).into_iter::<BuildMessage>();
    for message in messages {
        let message = message.map_err(|e| ApiError::Decode {
            path: path.to_owned(),
            source: e,
        })?;

        if let Some(line) = message.stream.as_deref().map(str::trim_end)
            && !line.is_empty()
        {
            tracing::info!(target: "docker_build", "{line}");
        }

        if message.error.is_some() || message.error_detail.is_some() {
            let detail = message
                .error_detail
                .and_then(|d| d.message)
                .or(message.error)
                .unwrap_or_else(|| "unknown build error".to_owned());
            return Err(ApiError::BuildFailed {
                tag: tag.to_owned(),
                message: detail,
            });
        }
    }
    Ok(())
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to portainer failed")]
    Transport {
        #[from]
        source: TransportError,
    },

    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: Method,
        path: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response body from {path}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },

    #[error("failed to encode request body for {path}")]
    Encode {
        path: String,
        source: serde_json::Error,
    },

    #[error(
        "endpoint {name} not found; available endpoints: {}",
        format_names(available)
    )]
    EndpointNotFound { name: String, available: Vec<String> },

    #[error("build of image {tag} failed: {message}")]
    BuildFailed { tag: String, message: String },

    #[error("container {container_id} was created without a portainer resource control")]
    MissingResourceControl { container_id: String },
}

impl ApiError {
    fn from_response(method: Method, path: String, response: &ApiResponse) -> Self {
        let parsed: PortainerErrorBody = match serde_json::from_slice(&response.body) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "error response is not a portainer error body");
                PortainerErrorBody::default()
            }
        };

        let message = match (parsed.message, parsed.details) {
            (Some(message), Some(details)) if message != details => {
                format!("{message} ({details})")
            }
            (Some(message), _) => message,
            (None, Some(details)) => details,
            (None, None) => raw_excerpt(&response.body),
        };

        Self::Status {
            method,
            path,
            status: response.status,
            message,
        }
    }
}

fn raw_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "no details".to_owned()
    } else {
        text.chars().take(200).collect()
    }
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_owned()
    } else {
        names.join(", ")
    }
}
