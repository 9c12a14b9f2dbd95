use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures that abort an addition run.
///
/// Only two kinds exist: the source side (reading a target file) and the
/// destination side (resolving or writing the output).
#[derive(Error, Debug)]
pub enum AdditionError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl AdditionError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        AdditionError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        AdditionError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, AdditionError::Read { .. })
    }

    pub fn is_write(&self) -> bool {
        matches!(self, AdditionError::Write { .. })
    }

    /// The file the failure concerns.
    pub fn path(&self) -> &Path {
        match self {
            AdditionError::Read { path, .. } | AdditionError::Write { path, .. } => path,
        }
    }
}
