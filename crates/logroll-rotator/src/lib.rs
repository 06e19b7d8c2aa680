//! logroll rotator - size-triggered log rotation, retention and compression
//!
//! A [`Rotator`] appends bytes to an active file. Once the file reaches its
//! threshold at a line boundary it is renamed to `<path>.<N>`, backups past
//! the retention limit are pruned, and the new backup is handed to a
//! background [`CompressionPipeline`].

pub mod capture;
mod compress;
mod rotation;
mod writer;

pub use capture::capture;
pub use compress::{compress_file, CompressionPipeline, Compressor, GzipCompressor};
pub use rotation::{backup_path, compressed_backup_path, next_sequence, parse_sequence, prune_backups};
pub use writer::Rotator;

pub use logroll_core::{CompressionKind, Error, Result, RotatorConfig};
