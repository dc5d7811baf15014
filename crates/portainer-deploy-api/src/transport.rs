use std::fmt;

use portainer_deploy_core::DeployConfig;
use reqwest::header::CONTENT_TYPE;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

#[derive(Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Build context archive, sent as `application/x-tar`.
    Tar(Vec<u8>),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Tar(bytes) => write!(f, "Tar({} bytes)", bytes.len()),
        }
    }
}

/// One API call, with `path` relative to the Portainer API root.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Session token, sent as `Authorization: Bearer <token>`.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_owned(), value.into()));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn tar(mut self, archive: Vec<u8>) -> Self {
        self.body = RequestBody::Tar(archive);
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_owned());
        self
    }

    /// Value of a query parameter, if set.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("bearer", &self.bearer.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the HTTP stack for testability.
///
/// Production code uses [`ReqwestTransport`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait HttpTransport: Send + Sync {
    /// Send one request and return the raw response, whatever its status.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport rooted at the Portainer API base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Client for `config.base_url()`, routed through `config.proxy` if set.
    ///
    /// No request timeout is configured; image builds can run for a long time.
    pub fn new(config: &DeployConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = &config.proxy {
            let mut route = reqwest::Proxy::all(proxy.url())
                .map_err(|e| TransportError::InvalidProxy { source: e })?;
            if let Some(auth) = proxy.credentials() {
                route = route.basic_auth(&auth.username, &auth.password);
            }
            builder = builder.proxy(route);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::ClientBuild { source: e })?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            bearer,
        } = request;
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));

        let mut builder = self.client.request(method.into(), &url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = &bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Tar(archive) => builder
                .header(CONTENT_TYPE, "application/x-tar")
                .body(archive),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request {
                method,
                url: url.clone(),
                source: e,
            })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::ReadBody {
                method,
                url: url.clone(),
                source: e,
            })?;

        tracing::debug!(%method, %url, status, bytes = body.len(), "portainer response");
        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portainer_deploy_core::{ProxyAuth, ProxyConfig};

    fn config_with_proxy(proxy: ProxyConfig) -> DeployConfig {
        DeployConfig {
            portainer_host: "portainer.test".to_owned(),
            proxy: Some(proxy),
            ..Default::default()
        }
    }

    #[test]
    fn builds_without_proxy() {
        let config = DeployConfig {
            portainer_host: "portainer.test".to_owned(),
            ..Default::default()
        };
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.base_url, "http://portainer.test:9000/api/");
    }

    #[test]
    fn proxy_password_with_url_delimiters_is_accepted() {
        let config = config_with_proxy(ProxyConfig::Parts {
            protocol: None,
            host: "px".to_owned(),
            port: 3128,
            auth: Some(ProxyAuth {
                username: "u".to_owned(),
                password: "a/b#c?d:e".to_owned(),
            }),
        });

        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[test]
    fn proxy_url_form_is_accepted() {
        let config = config_with_proxy(ProxyConfig::Url("http://proxy.corp:3128".to_owned()));
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[test]
    fn malformed_proxy_url_is_invalid_proxy() {
        let config = config_with_proxy(ProxyConfig::Url("http://[::1:3128".to_owned()));

        let err = ReqwestTransport::new(&config).unwrap_err();
        assert!(matches!(err, TransportError::InvalidProxy { .. }), "got {err:?}");
        assert_eq!(err.to_string(), "invalid proxy configuration");
    }
}
