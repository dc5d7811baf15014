pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{ApiError, Credentials, PortainerClient, Session};
pub use error::TransportError;
pub use models::{
    ContainerSummary, CreateContainer, CreatedContainer, Endpoint, ImageSummary,
    ResourceControlUpdate, Team,
};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport, RequestBody};
