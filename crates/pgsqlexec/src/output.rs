//! Where CSV exports are written.

use crate::error::{ExecError, ExecResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Which form of the CSV path to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Output directory joined with the file name.
    Absolute,
    /// The bare file name.
    Relative,
}

impl FromStr for PathKind {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abs" | "absolute" => Ok(Self::Absolute),
            "rel" | "relative" => Ok(Self::Relative),
            _ => Err(ExecError::config(format!(
                "path kind must be absolute or relative, got '{s}'"
            ))),
        }
    }
}

/// The CSV file an executor exports into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTarget {
    dir: PathBuf,
    file_name: String,
}

impl CsvTarget {
    /// `name` becomes `<name>.csv`; without one a unique file name is generated.
    pub fn new(dir: impl Into<PathBuf>, name: Option<&str>) -> Self {
        let file_name = match name {
            Some(name) => format!("{name}.csv"),
            None => generated_file_name(),
        };
        Self {
            dir: dir.into(),
            file_name,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn absolute(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    pub fn relative(&self) -> PathBuf {
        PathBuf::from(&self.file_name)
    }

    pub fn path(&self, kind: PathKind) -> PathBuf {
        match kind {
            PathKind::Absolute => self.absolute(),
            PathKind::Relative => self.relative(),
        }
    }
}

fn generated_file_name() -> String {
    format!("tmp{}.csv", Uuid::new_v4().simple())
}

/// Parse a path kind and look it up on an optional target.
pub(crate) fn csv_path(target: Option<&CsvTarget>, kind: &str) -> ExecResult<PathBuf> {
    let kind = kind.parse::<PathKind>()?;
    let target = target.ok_or_else(|| {
        ExecError::config("CSV path requested, but no output directory is set")
    })?;
    Ok(target.path(kind))
}
