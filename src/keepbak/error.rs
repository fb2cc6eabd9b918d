use crate::commands::CmdResult;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeepbakError {
    /// Rejected before anything on disk was touched.
    #[error("{0}")]
    Validation(String),

    #[error("unable to backup {}: {source}", path.display())]
    Transfer {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to cleanup backups, {0}")]
    Cleanup(CleanupFailures),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid artifact pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl KeepbakError {
    pub fn transfer(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Transfer {
            path: path.into(),
            source,
        }
    }
}

/// A single stale artifact (or the destination scan itself) that could not be removed.
#[derive(Debug)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Every failure collected during one retention pass.
#[derive(Debug, Default)]
pub struct CleanupFailures {
    pub failures: Vec<CleanupFailure>,
    /// Number of deletions attempted, including the failed ones.
    pub attempted: usize,
    /// What the run did before and around the failures: the new backup, the
    /// removals that worked, one error message per failure.
    pub outcome: CmdResult,
}

impl CleanupFailures {
    pub fn push(&mut self, path: impl Into<PathBuf>, error: io::Error) {
        self.failures.push(CleanupFailure {
            path: path.into(),
            error,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn first(&self) -> Option<&CleanupFailure> {
        self.failures.first()
    }
}

impl fmt::Display for CleanupFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.as_slice() {
            [] => write!(f, "no failures"),
            [only] => write!(f, "{}", only),
            [first, rest @ ..] => write!(
                f,
                "{} of {} deletions failed (first: {}; {} more)",
                self.failures.len(),
                self.attempted.max(self.failures.len()),
                first,
                rest.len()
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, KeepbakError>;
