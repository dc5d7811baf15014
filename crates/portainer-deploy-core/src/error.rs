use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("`{0}` is missing from the config file")]
    MissingField(&'static str),

    // ── package.json discovery ──
    #[error("failed to read package manifest {path}")]
    ManifestLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse package manifest {path}")]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    // ── Name resolution ──
    #[error("no image name (set `imageName` in the config or add a package.json with a name)")]
    MissingImageName,

    #[error(
        "no image version (set `imageVersion` in the config or add a package.json with a version)"
    )]
    MissingImageVersion,

    #[error(
        "no container name (set `containerName` in the config or add a package.json with a name)"
    )]
    MissingContainerName,
}
