//! Filesystem layout and path utilities.
//!
//! This module centralizes filesystem- and path-related logic for
//! `sheetdb-core`. It maps a database root directory to the locations of
//! table manifests and data segments, and provides small helpers for the
//! write protocol:
//!
//! - Atomic manifest replacement (write-then-rename), so a failed
//!   operation never leaves a half-written manifest behind.
//! - Create-new segment writes, so data files are never overwritten.
//!
//! Only the local filesystem is supported; the API is shaped so a future
//! object-storage adapter would not require rewriting the catalog and
//! database logic.

use snafu::{Backtrace, prelude::*};
use std::{
    error::Error,
    fmt, io,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
};

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Represents the location of a sheetdb database.
#[derive(Clone, Debug)]
pub enum DatabaseLocation {
    /// A database stored on the local filesystem at the given root.
    Local(PathBuf),
}

impl DatabaseLocation {
    /// Creates a new `DatabaseLocation` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        DatabaseLocation::Local(root.into())
    }

    /// The database root as a local path.
    pub fn root(&self) -> &Path {
        match self {
            DatabaseLocation::Local(root) => root,
        }
    }

    /// Join a relative path onto the database root.
    pub fn join(&self, rel: &Path) -> PathBuf {
        match self {
            DatabaseLocation::Local(root) => root.join(rel),
        }
    }
}

/// Errors produced by the storage backend implementation.
#[derive(Debug)]
pub enum BackendError {
    /// A local filesystem I/O error.
    Local(io::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "local I/O error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) => Some(e),
        }
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
pub enum StorageError {
    /// The specified path was not found.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The specified path already exists when creation was requested with
    /// create-new semantics.
    #[snafu(display("Path already exists: {path}"))]
    AlreadyExists {
        /// The path that was found to already exist.
        path: String,
        /// Underlying backend error that indicates the existing resource.
        source: BackendError,
        /// The backtrace captured when the error occurred.
        backtrace: Backtrace,
    },

    /// An I/O error occurred on the local filesystem.
    #[snafu(display("Local I/O error at {path}: {source}"))]
    OtherIo {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying backend I/O error with platform-specific details.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

async fn create_parent_dir(abs: &Path) -> StorageResult<()> {
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: parent.display().to_string(),
            })?;
    }
    Ok(())
}

/// Guard that removes a temporary file on drop unless disarmed.
/// Used to ensure cleanup on error paths during atomic writes.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Disarm the guard so the file is NOT removed on drop.
    /// Call this after a successful rename.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort cleanup; we are likely already handling another error.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Write `contents` to `rel_path` inside `location` using an atomic write.
///
/// Performs a write-then-rename sequence: the payload goes to a temporary
/// file next to the target path, is synced, and is then renamed into
/// place. This is the commit step for manifests: readers either see the
/// old manifest or the new one, never a partial file.
///
/// # Errors
///
/// Returns [`StorageError::OtherIo`] when filesystem I/O fails.
pub async fn write_atomic(
    location: &DatabaseLocation,
    rel_path: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    let abs = location.join(rel_path);

    create_parent_dir(&abs).await?;

    let tmp_path = abs.with_extension("tmp");
    let mut guard = TempFileGuard::new(tmp_path.clone());

    {
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;

        file.write_all(contents)
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;

        file.sync_all()
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: tmp_path.display().to_string(),
            })?;
    }

    fs::rename(&tmp_path, &abs)
        .await
        .map_err(BackendError::Local)
        .context(OtherIoSnafu {
            path: abs.display().to_string(),
        })?;

    // Success - don't remove the temp file (it's been renamed).
    guard.disarm();

    Ok(())
}

/// Create a *new* file at `rel_path` and write `contents`, failing if the
/// file already exists.
///
/// Used for data segments, which are immutable once written.
pub async fn write_new(
    location: &DatabaseLocation,
    rel_path: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    let abs = location.join(rel_path);
    create_parent_dir(&abs).await?;

    let path_str = abs.display().to_string();

    // Atomic "create only if not exists" on the target path.
    let open_result = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&abs)
        .await;

    let mut file = match open_result {
        Ok(f) => f,
        Err(e) => {
            let backend = BackendError::Local(e);
            // Classify AlreadyExists vs "other I/O".
            let storage_err = match &backend {
                BackendError::Local(inner) if inner.kind() == io::ErrorKind::AlreadyExists => {
                    StorageError::AlreadyExists {
                        path: path_str,
                        source: backend,
                        backtrace: Backtrace::capture(),
                    }
                }
                _ => StorageError::OtherIo {
                    path: path_str,
                    source: backend,
                    backtrace: Backtrace::capture(),
                },
            };
            return Err(storage_err);
        }
    };

    file.write_all(contents)
        .await
        .map_err(BackendError::Local)
        .context(OtherIoSnafu {
            path: abs.display().to_string(),
        })?;

    file.sync_all()
        .await
        .map_err(BackendError::Local)
        .context(OtherIoSnafu {
            path: abs.display().to_string(),
        })?;

    Ok(())
}

/// Read the file at `rel_path` within the given `location` as a `String`.
pub async fn read_to_string(location: &DatabaseLocation, rel_path: &Path) -> StorageResult<String> {
    let abs = location.join(rel_path);

    match fs::read_to_string(&abs).await {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BackendError::Local(e)).context(NotFoundSnafu {
                path: abs.display().to_string(),
            })
        }
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: abs.display().to_string(),
        }),
    }
}

/// Read the full contents of a file at `rel_path` within `location`.
///
/// # Errors
///
/// [`StorageError::NotFound`] if the file does not exist, otherwise
/// [`StorageError::OtherIo`] for any other I/O failure.
pub async fn read_all_bytes(location: &DatabaseLocation, rel_path: &Path) -> StorageResult<Vec<u8>> {
    let abs = location.join(rel_path);
    let path_str = abs.display().to_string();

    match fs::read(&abs).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BackendError::Local(e)).context(NotFoundSnafu { path: path_str })
        }
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu { path: path_str }),
    }
}

/// List the names of subdirectories of `rel_path`, sorted.
///
/// A missing directory yields an empty list: a freshly created database
/// has no tables yet.
pub async fn list_subdirs(
    location: &DatabaseLocation,
    rel_path: &Path,
) -> StorageResult<Vec<String>> {
    let abs = location.join(rel_path);
    let path_str = abs.display().to_string();

    let mut entries = match fs::read_dir(&abs).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(BackendError::Local(e)).context(OtherIoSnafu { path: path_str });
        }
    };

    let mut names = Vec::new();
    loop {
        let entry = entries
            .next_entry()
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: path_str.clone(),
            })?;
        let Some(entry) = entry else { break };

        let file_type = entry
            .file_type()
            .await
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: path_str.clone(),
            })?;
        if file_type.is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    names.sort();
    Ok(names)
}

/// Ensure the database root directory exists.
pub async fn create_root(location: &DatabaseLocation) -> StorageResult<()> {
    let root = location.root();
    fs::create_dir_all(root)
        .await
        .map_err(BackendError::Local)
        .context(OtherIoSnafu {
            path: root.display().to_string(),
        })
}

/// Remove the entire database root directory.
pub async fn remove_root(location: &DatabaseLocation) -> StorageResult<()> {
    let root = location.root();
    match fs::remove_dir_all(root).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: root.display().to_string(),
        }),
    }
}
