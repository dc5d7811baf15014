//! Core types and configuration for portainer-deploy.
//!
//! This crate defines the deploy configuration file schema ([`DeployConfig`]),
//! `package.json` discovery ([`PackageManifest`]), image tag and container
//! name resolution, and shared error types.

pub mod config;
pub mod error;
pub mod package;

pub use config::{DeployConfig, ProxyAuth, ProxyConfig};
pub use error::{Error, Result};
pub use package::{ImageTag, PackageManifest, resolve_container_name};
