//! Depth-first recursive removal that never follows symbolic links.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_fs_ext::DirExtUtf8;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tracing::{debug, warn};

use super::map_io_error;
use crate::error::FilesystemError;

/// Outcome of a successful recursive removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Regular files removed.
    pub files: usize,
    /// Directories removed, including the root.
    pub directories: usize,
    /// Symbolic links unlinked without being traversed.
    pub symlinks: usize,
    /// Whether the path was already absent.
    pub already_absent: bool,
}

impl RemovalReport {
    /// Total number of entries removed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.files + self.directories + self.symlinks
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// Accumulates per-entry results during a walk.
#[derive(Debug, Default)]
struct Walk {
    report: RemovalReport,
    failures: Vec<(Utf8PathBuf, io::Error)>,
}

impl Walk {
    fn record(&mut self, kind: EntryKind, path: &Utf8Path, result: io::Result<()>) {
        match result {
            Ok(()) => match kind {
                EntryKind::File => self.report.files += 1,
                EntryKind::Directory => self.report.directories += 1,
                EntryKind::Symlink => self.report.symlinks += 1,
            },
            Err(error) => {
                warn!(%path, %error, "failed to remove workspace entry");
                self.failures.push((path.to_path_buf(), error));
            }
        }
    }

    fn fail(&mut self, path: &Utf8Path, error: io::Error) {
        self.record(EntryKind::File, path, Err(error));
    }

    /// Empty `dir`, whose on-disk location is `path`.
    fn empty_dir(&mut self, dir: &Dir, path: &Utf8Path) {
        let entries = match dir.entries() {
            Ok(entries) => entries,
            Err(error) => return self.fail(path, error),
        };

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(error) => {
                    self.fail(path, error);
                    continue;
                }
            };
            let name = match entry.file_name() {
                Ok(name) => name,
                Err(error) => {
                    self.fail(path, error);
                    continue;
                }
            };
            let child = path.join(&name);
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => self.remove_dir(dir, &name, &child),
                Ok(file_type) if file_type.is_symlink() => {
                    self.record(EntryKind::Symlink, &child, dir.remove_file(&name));
                }
                Ok(_) => self.record(EntryKind::File, &child, dir.remove_file(&name)),
                Err(error) => self.fail(&child, error),
            }
        }
    }

    /// Empty and remove the subdirectory `name` of `parent`.
    fn remove_dir(&mut self, parent: &Dir, name: &str, path: &Utf8Path) {
        match parent.open_dir_nofollow(name) {
            Ok(child) => {
                self.empty_dir(&child, path);
                drop(child);
                self.record(EntryKind::Directory, path, parent.remove_dir(name));
            }
            Err(error) => self.fail(path, error),
        }
    }

    fn finish(self, root: &Utf8Path) -> Result<RemovalReport, FilesystemError> {
        let Some((first_path, first_error)) = self.failures.first() else {
            return Ok(self.report);
        };
        Err(FilesystemError::RemovalIncomplete {
            path: root.as_std_path().to_path_buf(),
            failed: self.failures.len(),
            first_failure: format!("{first_path}: {first_error}"),
        })
    }
}

/// Remove `path` and everything below it, depth-first.
///
/// Directories are emptied before they are removed. Symbolic links are
/// unlinked and never traversed, even when `path` itself is a link. A missing
/// `path` is a successful no-op.
///
/// Every entry is attempted even after a failure; failures are aggregated.
///
/// # Errors
///
/// Returns `FilesystemError::RemovalIncomplete` if any entry could not be
/// removed, or another `FilesystemError` if `path` cannot be inspected.
pub fn remove_workspace_recursive(path: &Utf8Path) -> Result<RemovalReport, FilesystemError> {
    let Some(name) = path.file_name() else {
        return Err(FilesystemError::IoError {
            path: path.as_std_path().to_path_buf(),
            message: String::from("refusing to remove a path without a final component"),
        });
    };
    let parent_path = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));

    let parent = match Dir::open_ambient_dir(parent_path, ambient_authority()) {
        Ok(parent) => parent,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(absent(path)),
        Err(error) => return Err(map_io_error(parent_path, &error)),
    };

    let metadata = match parent.symlink_metadata(name) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(absent(path)),
        Err(error) => return Err(map_io_error(path, &error)),
    };

    let mut walk = Walk::default();
    let file_type = metadata.file_type();
    if file_type.is_dir() {
        walk.remove_dir(&parent, name, path);
    } else if file_type.is_symlink() {
        walk.record(EntryKind::Symlink, path, parent.remove_file(name));
    } else {
        walk.record(EntryKind::File, path, parent.remove_file(name));
    }

    let report = walk.finish(path)?;
    debug!(%path, removed = report.total(), "removed workspace");
    Ok(report)
}

fn absent(path: &Utf8Path) -> RemovalReport {
    debug!(%path, "workspace already absent");
    RemovalReport {
        already_absent: true,
        ..RemovalReport::default()
    }
}
