//! Discovery and invocation of the wrapped tool.
//!
//! The orchestrator only sees the typed boundary defined here: a
//! [`ToolRunner`] either succeeds or returns a [`ToolError`]. A failed run
//! carries the raw error text, which always embeds `return_code=<value>` so
//! the failure classifier can recover the exit code or signal.

pub mod mothur;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0} not found on path. Is it installed?")]
    NotFound(String),

    #[error("Failed to launch {program}: {source} (return_code=None)")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool timed out after {0:?} and was killed (return_code=None)")]
    TimedOut(Duration),

    #[error("{message}")]
    Failed { message: String },
}

/// Everything needed to run the tool once
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    /// Upper bound on the wait; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

/// Runs an [`Invocation`] to completion
pub trait ToolRunner {
    /// # Errors
    ///
    /// Returns a `ToolError` when the tool cannot be started, exceeds its
    /// timeout, or exits unsuccessfully.
    fn run(&self, invocation: &Invocation) -> Result<(), ToolError>;
}

/// Finds executables on a search path (`PATH` by default)
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Search the given path list instead of the process `PATH`
    #[must_use]
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Resolve `name` to an executable file.
    ///
    /// Names containing a path separator are checked directly; bare names are
    /// looked up in each search path directory in order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let candidate = Path::new(name);
        if candidate.components().count() > 1 {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }

        let path_var = match &self.search_path {
            Some(p) => p.clone(),
            None => std::env::var_os("PATH")?,
        };
        std::env::split_paths(&path_var)
            .map(|dir| dir.join(name))
            .find(|p| is_executable(p))
    }

    /// Like [`find`](Self::find), but missing tools are an error
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if the tool is not on the search path.
    pub fn require(&self, name: &str) -> Result<PathBuf, ToolError> {
        self.find(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
