//! Build context selection and packaging for portainer-deploy.
//!
//! # Build context
//!
//! ```text
//! portainer-deploy config=deploy.json
//!   1. Select   ── top-level entries of the project directory
//!                  filtered by buildCtxWhitelist / buildCtxBlacklist
//!   2. Archive  ── gzip tar at dist/build-ctx-tmp.tar.gz
//!   3. Upload   ── POST .../docker/build (done by the API client)
//!   4. Remove   ── archive deleted after the upload
//! ```
//!
//! # Filtering
//!
//! Only top-level names are matched:
//! - **Whitelist**: only listed entries are sent; the blacklist is ignored
//! - **Blacklist**: everything except listed entries is sent
//! - **Neither**: the whole directory is sent
//!
//! Directories are archived recursively. The archive never contains itself.

pub mod context;

pub use context::{BuildContext, ContextError, FilterMode, collect_entries};
