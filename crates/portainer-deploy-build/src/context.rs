use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use portainer_deploy_core::DeployConfig;

/// Directory (relative to the project) that holds the temporary archive.
pub const ARCHIVE_DIR: &str = "dist";

/// File name of the temporary archive inside [`ARCHIVE_DIR`].
pub const ARCHIVE_FILE: &str = "build-ctx-tmp.tar.gz";

/// Which top-level entries of the project directory go into the build context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMode {
    /// Only these entries are included.
    Whitelist(BTreeSet<String>),
    /// Everything except these entries is included.
    Blacklist(BTreeSet<String>),
}

impl FilterMode {
    /// A whitelist, when present, suppresses the blacklist entirely.
    pub fn from_lists(whitelist: Option<&[String]>, blacklist: Option<&[String]>) -> Self {
        match (whitelist, blacklist) {
            (Some(list), _) => Self::Whitelist(list.iter().cloned().collect()),
            (None, Some(list)) => Self::Blacklist(list.iter().cloned().collect()),
            (None, None) => Self::Blacklist(BTreeSet::new()),
        }
    }

    pub fn from_config(config: &DeployConfig) -> Self {
        Self::from_lists(
            config.build_ctx_whitelist.as_deref(),
            config.build_ctx_blacklist.as_deref(),
        )
    }

    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::Whitelist(set) => set.contains(name),
            Self::Blacklist(set) => !set.contains(name),
        }
    }
}

/// Lists the top-level entries of `project_dir` accepted by `mode`, sorted by name.
pub fn collect_entries(project_dir: &Path, mode: &FilterMode) -> Result<Vec<String>, ContextError> {
    let read_dir = std::fs::read_dir(project_dir).map_err(|e| ContextError::ReadDir {
        path: project_dir.to_path_buf(),
        source: e,
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| ContextError::ReadDir {
            path: project_dir.to_path_buf(),
            source: e,
        })?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::warn!(name = ?raw, "skipping entry with non UTF-8 name");
                continue;
            }
        };
        if mode.allows(&name) {
            entries.push(name);
        }
    }
    entries.sort();

    tracing::debug!(count = entries.len(), ?entries, "collected build context entries");
    Ok(entries)
}

/// Temporary gzip tar of the build context on local disk.
///
/// Removed explicitly with [`BuildContext::remove`] once uploaded. If the
/// handle is dropped first (an earlier step failed), the file is removed
/// on a best-effort basis.
#[derive(Debug)]
pub struct BuildContext {
    path: PathBuf,
    removed: bool,
}

impl BuildContext {
    /// Archives `entries` (relative to `project_dir`) into
    /// `<project_dir>/dist/build-ctx-tmp.tar.gz`, creating `dist/` if needed.
    pub fn create(project_dir: &Path, entries: &[String]) -> Result<Self, ContextError> {
        let archive_dir = project_dir.join(ARCHIVE_DIR);
        std::fs::create_dir_all(&archive_dir).map_err(|e| ContextError::CreateDir {
            path: archive_dir.clone(),
            source: e,
        })?;

        let path = archive_dir.join(ARCHIVE_FILE);
        let file = File::create(&path).map_err(|e| ContextError::CreateArchive {
            path: path.clone(),
            source: e,
        })?;

        // From here on a failure leaves a partial file; the guard cleans it up.
        let context = Self {
            path,
            removed: false,
        };

        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(false);

        for entry in entries {
            append_entry(&mut builder, project_dir, Path::new(entry), &context.path)?;
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| ContextError::CreateArchive {
                path: context.path.clone(),
                source: e,
            })?;
        let mut file = encoder.finish().map_err(|e| ContextError::CreateArchive {
            path: context.path.clone(),
            source: e,
        })?;
        file.flush().map_err(|e| ContextError::CreateArchive {
            path: context.path.clone(),
            source: e,
        })?;

        tracing::debug!(path = %context.path.display(), "created build context archive");
        Ok(context)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the finished archive back into memory for upload.
    pub fn bytes(&self) -> Result<Vec<u8>, ContextError> {
        std::fs::read(&self.path).map_err(|e| ContextError::ReadArchive {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Deletes the archive from disk.
    pub fn remove(mut self) -> Result<(), ContextError> {
        self.removed = true;
        std::fs::remove_file(&self.path).map_err(|e| ContextError::RemoveArchive {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl Drop for BuildContext {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed leftover build context"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove leftover build context",
            ),
        }
    }
}

/// Appends one entry, recursing into directories. `skip` is the archive itself.
fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    root: &Path,
    relative: &Path,
    skip: &Path,
) -> Result<(), ContextError> {
    let full = root.join(relative);
    if full == skip {
        return Ok(());
    }

    let meta = std::fs::symlink_metadata(&full).map_err(|e| ContextError::AppendEntry {
        path: full.clone(),
        source: e,
    })?;

    if !meta.is_dir() {
        return builder
            .append_path_with_name(&full, relative)
            .map_err(|e| ContextError::AppendEntry {
                path: full,
                source: e,
            });
    }

    builder
        .append_dir(relative, &full)
        .map_err(|e| ContextError::AppendEntry {
            path: full.clone(),
            source: e,
        })?;

    let read_dir = std::fs::read_dir(&full).map_err(|e| ContextError::ReadDir {
        path: full.clone(),
        source: e,
    })?;
    let mut children = Vec::new();
    for child in read_dir {
        let child = child.map_err(|e| ContextError::ReadDir {
            path: full.clone(),
            source: e,
        })?;
        children.push(child.file_name());
    }
    children.sort();

    for child in children {
        append_entry(builder, root, &relative.join(child), skip)?;
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to read directory {path}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write build context archive {path}")]
    CreateArchive {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to add {path} to the build context")]
    AppendEntry {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read build context archive {path}")]
    ReadArchive {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove build context archive {path}")]
    RemoveArchive {
        path: PathBuf,
        source: std::io::Error,
    },
}
