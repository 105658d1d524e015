// Error types for the catsnap library.
// Everything that can go wrong while bootstrapping config files or talking
// to the cloud services ends up in `Error`. The binary wraps these with
// `anyhow` for display.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("interactive prompt failed: {0}")]
    Prompt(#[source] io::Error),

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}: missing `{key}` in section [{section}]", .path.display())]
    MissingKey {
        path: PathBuf,
        section: &'static str,
        key: &'static str,
    },

    /// A table with this name already exists. Raised by `TableStore::create_table`
    /// when the service reports the name as in use.
    #[error("table `{0}` already exists")]
    TableExists(String),

    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    #[error("could not determine the current user name")]
    UnknownUser,

    #[error("failed to start the I/O runtime: {0}")]
    Runtime(#[source] io::Error),
}

impl Error {
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Service {
            operation,
            message: message.into(),
        }
    }
}
