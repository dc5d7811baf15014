use crate::transport::Method;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client")]
    ClientBuild { source: reqwest::Error },

    // The proxy URL may carry credentials, so it is not part of the message.
    #[error("invalid proxy configuration")]
    InvalidProxy { source: reqwest::Error },

    #[error("{method} {url} failed")]
    Request {
        method: Method,
        url: String,
        source: reqwest::Error,
    },

    #[error("failed to read response body of {method} {url}")]
    ReadBody {
        method: Method,
        url: String,
        source: reqwest::Error,
    },
}
