use std::env;
use std::path::{Path, PathBuf};

use bk_core::{Error, Result};

use super::{Override, Scoped};

/// Changes the working directory; changes back on restore.
#[derive(Debug, Clone)]
pub struct WorkingDirectory {
    target: PathBuf,
}

impl WorkingDirectory {
    /// Absolute directory installed on entry.
    pub fn target(&self) -> &Path {
        &self.target
    }
}

fn change_dir(path: &Path) -> Result<()> {
    env::set_current_dir(path)
        .map_err(|source| Error::DirectoryUnavailable { path: path.to_path_buf(), source })
}

impl Override for WorkingDirectory {
    type Snapshot = PathBuf;
    const KIND: &'static str = "working directory";

    fn capture(&mut self) -> Result<PathBuf> {
        env::current_dir()
            .map_err(|source| Error::DirectoryUnavailable { path: PathBuf::from("."), source })
    }

    fn install(&mut self, _captured: &PathBuf) -> Result<()> {
        change_dir(&self.target)?;
        log::debug!("changed directory to {}", self.target.display());
        Ok(())
    }

    fn restore(&mut self, snapshot: PathBuf) -> Result<()> {
        change_dir(&snapshot)
    }
}

/// Scope that runs a block in another working directory.
pub type WorkingDirectoryScope = Scoped<WorkingDirectory>;

impl WorkingDirectoryScope {
    /// Resolve `path` against the current directory now; later directory
    /// changes do not affect which directory the scope enters.
    ///
    /// The directory is not required to exist until the scope is entered.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let target = std::path::absolute(path).map_err(|e| {
            Error::InvalidArgument(format!("cannot resolve directory {}: {e}", path.display()))
        })?;
        Ok(Scoped::from_override(WorkingDirectory { target }))
    }

    /// Absolute directory entered by this scope.
    pub fn target(&self) -> &Path {
        self.resource().target()
    }
}
