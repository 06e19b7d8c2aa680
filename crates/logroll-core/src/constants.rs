//! Constants and default values for logroll

/// Bytes per configured kilobyte of threshold
pub const BYTES_PER_KB: u64 = 1000;

/// Default size threshold in kilobytes (10MB)
pub const DEFAULT_THRESHOLD_KB: u64 = 10_000;

/// Default max backups to keep (0 = unlimited)
pub const DEFAULT_MAX_BACKUPS: usize = 0;

/// Default suffix for compressed backups
pub const DEFAULT_COMPRESSED_SUFFIX: &str = "gz";

/// Default gzip compression level
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Highest accepted gzip compression level
pub const MAX_GZIP_LEVEL: u32 = 9;

/// Name of the background compression thread
pub const COMPRESS_THREAD_NAME: &str = "logroll-compress";

/// Convert a threshold in kilobytes to bytes
pub fn threshold_bytes(threshold_kb: u64) -> u64 {
    threshold_kb.saturating_mul(BYTES_PER_KB)
}
