//! Error types for logroll

use std::path::PathBuf;

/// logroll error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("No active log file: {0}")]
    NoActiveFile(PathBuf),

    #[error("End of input")]
    EndOfInput,

    #[error("Rotation of {path} failed: {source}")]
    RotationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Invalid backup pattern: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for logroll
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Error::CompressionFailed(msg.into())
    }

    pub fn rotation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::RotationFailed {
            path: path.into(),
            source,
        }
    }
}

/// Lets the `Write` impl on the rotator surface rotation failures.
impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::IoError(e) => e,
            Error::EndOfInput => std::io::Error::new(std::io::ErrorKind::UnexpectedEof, err),
            Error::NoActiveFile(_) => std::io::Error::new(std::io::ErrorKind::NotConnected, err),
            other => std::io::Error::other(other),
        }
    }
}
