//! Rotator configuration
//!
//! There is no configuration file; callers (the CLI, or library users)
//! build a [`RotatorConfig`] directly and validate it before use.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::*;
use crate::error::{Error, Result};

/// Compression applied to rotated backups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionKind {
    #[default]
    Gzip,
    None,
}

impl CompressionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionKind::Gzip => "gzip",
            CompressionKind::None => "none",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, CompressionKind::None)
    }
}

impl FromStr for CompressionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gzip" | "gz" => Ok(CompressionKind::Gzip),
            "none" | "off" => Ok(CompressionKind::None),
            other => Err(Error::config(format!(
                "unknown compression '{}' (expected gzip or none)",
                other
            ))),
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to construct a rotator
#[derive(Debug, Clone)]
pub struct RotatorConfig {
    /// Active log file path
    pub path: PathBuf,
    /// Rotation threshold in kilobytes
    pub threshold_kb: u64,
    /// Duplicate every write to stdout
    pub tee: bool,
    /// Maximum number of backups to keep (0 = unlimited)
    pub max_backups: usize,
    /// Compression for rotated backups
    pub compression: CompressionKind,
    /// Compressed backup suffix; defaults to gz
    pub suffix: Option<String>,
    /// Gzip level (0-9)
    pub gzip_level: u32,
}

impl RotatorConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            threshold_kb: DEFAULT_THRESHOLD_KB,
            tee: false,
            max_backups: DEFAULT_MAX_BACKUPS,
            compression: CompressionKind::default(),
            suffix: None,
            gzip_level: DEFAULT_GZIP_LEVEL,
        }
    }

    pub fn threshold_kb(mut self, threshold_kb: u64) -> Self {
        self.threshold_kb = threshold_kb;
        self
    }

    pub fn tee(mut self, tee: bool) -> Self {
        self.tee = tee;
        self
    }

    pub fn max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    /// Set retention from a signed count; zero or negative means unlimited
    pub fn max_backups_signed(self, max_backups: i64) -> Self {
        self.max_backups(retention_limit(max_backups))
    }

    pub fn compression(mut self, compression: CompressionKind) -> Self {
        self.compression = compression;
        self
    }

    pub fn suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn gzip_level(mut self, level: u32) -> Self {
        self.gzip_level = level;
        self
    }

    /// Threshold in bytes
    pub fn threshold_bytes(&self) -> u64 {
        threshold_bytes(self.threshold_kb)
    }

    /// Effective compressed suffix, without a leading dot.
    ///
    /// Stays `gz` with compression off so backups compressed by an earlier
    /// run still count when numbering new ones.
    pub fn compressed_suffix(&self) -> String {
        match &self.suffix {
            Some(s) => normalize_suffix(s),
            None => DEFAULT_COMPRESSED_SUFFIX.to_string(),
        }
    }

    /// Check the config for values the rotator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::config("log path must not be empty"));
        }
        if self.path.file_name().is_none() {
            return Err(Error::config(format!(
                "log path has no file name: {}",
                self.path.display()
            )));
        }
        if self.threshold_kb == 0 {
            return Err(Error::config("size threshold must be positive"));
        }
        if self.compression.is_enabled() {
            if self.compressed_suffix().is_empty() {
                return Err(Error::config("compressed suffix must not be empty"));
            }
            if self.gzip_level > MAX_GZIP_LEVEL {
                return Err(Error::config(format!(
                    "gzip level {} out of range (0-{})",
                    self.gzip_level, MAX_GZIP_LEVEL
                )));
            }
        }
        Ok(())
    }
}

/// Strip a leading dot so ".gz" and "gz" name the same suffix
pub fn normalize_suffix(suffix: &str) -> String {
    suffix.strip_prefix('.').unwrap_or(suffix).to_string()
}

/// Map a signed retention count to the unsigned form (0 = unlimited)
pub fn retention_limit(max_backups: i64) -> usize {
    usize::try_from(max_backups).unwrap_or(0)
}
