//! Per-scenario local scratch directories.
//!
//! A [`LocalWorkspace`] is a uniquely named directory under a configured root.
//! It is created before a scenario's first step and removed with
//! [`remove_workspace_recursive`] afterwards.
//!
//! All filesystem access goes through `cap_std::fs_utf8` capability handles.
//! Removal never follows symbolic links: a link is unlinked as a link, and its
//! target is left untouched.

mod removal;


use std::io;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tracing::debug;

use crate::error::FilesystemError;

pub use removal::{RemovalReport, remove_workspace_recursive};

/// Counter that keeps names unique when two workspaces share a timestamp.
static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Build a run-unique name: `{prefix}{micros}_{pid}_{counter}`.
///
/// The timestamp orders names by creation time. The process id and counter
/// make names unique across concurrent scenarios and parallel runs.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_micros());
    let counter = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}{micros}_{}_{counter}", process::id())
}

/// A scratch directory owned by one scenario.
#[derive(Debug)]
pub struct LocalWorkspace {
    path: Utf8PathBuf,
    dir: Dir,
}

impl LocalWorkspace {
    /// Create a uniquely named workspace under `root`.
    ///
    /// `root` is created if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a `FilesystemError` if `root` or the workspace directory cannot
    /// be created.
    pub fn create(root: &Utf8Path, prefix: &str) -> Result<Self, FilesystemError> {
        Dir::create_ambient_dir_all(root, ambient_authority())
            .map_err(|error| map_io_error(root, &error))?;
        let root_dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(|error| map_io_error(root, &error))?;

        let name = unique_name(prefix);
        let path = root.join(&name);
        root_dir
            .create_dir(&name)
            .map_err(|error| map_io_error(&path, &error))?;
        let dir = root_dir
            .open_dir(&name)
            .map_err(|error| map_io_error(&path, &error))?;

        debug!(%path, "created local workspace");
        Ok(Self { path, dir })
    }

    /// The absolute path of the workspace directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The path a file named `name` has inside the workspace.
    #[must_use]
    pub fn file_path(&self, name: &str) -> Utf8PathBuf {
        self.path.join(name)
    }

    /// Write `content` to `name`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns a `FilesystemError` if the workspace is gone or the write fails.
    pub fn write_file(&self, name: &str, content: &[u8]) -> Result<Utf8PathBuf, FilesystemError> {
        let path = self.file_path(name);
        self.dir
            .write(name, content)
            .map_err(|error| map_io_error(&path, &error))?;
        debug!(%path, bytes = content.len(), "wrote workspace file");
        Ok(path)
    }

    /// Read the file `name` from the workspace.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError::NotFound` if the file does not exist.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>, FilesystemError> {
        self.dir
            .read(name)
            .map_err(|error| map_io_error(&self.file_path(name), &error))
    }

    /// Whether the workspace directory still exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Classify an I/O failure at `path`.
pub(crate) fn map_io_error(path: &Utf8Path, error: &io::Error) -> FilesystemError {
    let path_buf = path.as_std_path().to_path_buf();
    match error.kind() {
        io::ErrorKind::NotFound => FilesystemError::NotFound { path: path_buf },
        io::ErrorKind::PermissionDenied => FilesystemError::PermissionDenied { path: path_buf },
        _ => FilesystemError::IoError {
            path: path_buf,
            message: error.to_string(),
        },
    }
}
