//! Loading SQL text from files.
//!
//! [`SqlExec::append_file_with`](crate::SqlExec::append_file_with) takes any
//! [`SqlLoader`], which lets callers decide how a logical file reference turns
//! into SQL text (a project directory, embedded fixtures, a closure in tests).

use crate::error::{ExecError, ExecResult};
use std::path::{Path, PathBuf};

/// Resolves a file reference to its SQL contents.
pub trait SqlLoader {
    /// Read the SQL stored at `path`.
    fn load(&self, path: &Path) -> ExecResult<String>;
}

/// Reads files directly from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SqlLoader for FsLoader {
    fn load(&self, path: &Path) -> ExecResult<String> {
        std::fs::read_to_string(path).map_err(|e| ExecError::file(path, e))
    }
}

/// Reads files relative to a root directory.
///
/// Absolute paths bypass the root.
#[derive(Debug, Clone)]
pub struct DirLoader {
    root: PathBuf,
}

impl DirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The filesystem path `path` resolves to.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl SqlLoader for DirLoader {
    fn load(&self, path: &Path) -> ExecResult<String> {
        FsLoader.load(&self.resolve(path))
    }
}

impl<F> SqlLoader for F
where
    F: Fn(&Path) -> std::io::Result<String>,
{
    fn load(&self, path: &Path) -> ExecResult<String> {
        self(path).map_err(|e| ExecError::file(path, e))
    }
}
