//! Background compression of rotated backups

use flate2::write::GzEncoder;
use flate2::Compression;
use logroll_core::{constants, normalize_suffix, Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::rotation::with_extra_suffix;

/// A compressed stream writer that can be re-targeted for each backup.
///
/// The pipeline calls `reset` with a freshly created target, streams the
/// backup through `Write`, then `flush` and `close`.
pub trait Compressor: Write + Send {
    /// Start a new compressed stream into `target`, discarding prior state
    fn reset(&mut self, target: File);

    /// Finish the stream and release the target
    fn close(&mut self) -> io::Result<()>;
}

/// Gzip compressor backed by flate2
pub struct GzipCompressor {
    level: Compression,
    encoder: Option<GzEncoder<File>>,
}

impl GzipCompressor {
    pub fn new() -> Self {
        Self::with_level(constants::DEFAULT_GZIP_LEVEL)
    }

    /// Levels above 9 are clamped
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(constants::MAX_GZIP_LEVEL)),
            encoder: None,
        }
    }

    fn encoder(&mut self) -> io::Result<&mut GzEncoder<File>> {
        self.encoder
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "gzip compressor has no target"))
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for GzipCompressor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.flush(),
            None => Ok(()),
        }
    }
}

impl Compressor for GzipCompressor {
    fn reset(&mut self, target: File) {
        self.encoder = Some(GzEncoder::new(target, self.level));
    }

    fn close(&mut self) -> io::Result<()> {
        match self.encoder.take() {
            Some(encoder) => encoder.finish()?.sync_all(),
            None => Ok(()),
        }
    }
}

/// Compress `source` into `<source>.<suffix>` and return the target path.
///
/// The target is created exclusively, so an existing artifact is never
/// overwritten. The source is left untouched; on failure a partial target
/// may remain.
pub fn compress_file(compressor: &mut dyn Compressor, source: &Path, suffix: &str) -> Result<PathBuf> {
    let target = with_extra_suffix(source, suffix);

    let mut input = File::open(source)?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)?;

    compressor.reset(output);
    let copied = io::copy(&mut input, &mut *compressor).and_then(|n| compressor.flush().map(|_| n));
    // Close even after a failed copy so the target handle is released.
    let closed = compressor.close();

    let bytes = copied.map_err(|e| Error::compression(format!("{}: {}", source.display(), e)))?;
    closed.map_err(|e| Error::compression(format!("{}: {}", target.display(), e)))?;

    debug!("Compressed {} ({} bytes) -> {}", source.display(), bytes, target.display());
    Ok(target)
}

/// Compress one backup and remove it once the artifact is complete
fn run_job(compressor: &mut dyn Compressor, backup: &Path, suffix: &str) {
    match compress_file(compressor, backup, suffix) {
        Ok(target) => {
            if let Err(e) = fs::remove_file(backup) {
                warn!("Compressed {} but failed to remove it: {}", backup.display(), e);
            } else {
                info!("Compressed backup: {}", target.display());
            }
        }
        Err(e) => {
            warn!("Failed to compress {}, keeping it uncompressed: {}", backup.display(), e);
        }
    }
}

/// Single-worker queue that compresses backups in submission order.
///
/// Submitting never blocks. `drain` (also run on drop) waits until every
/// queued job has finished.
pub struct CompressionPipeline {
    tx: Option<crossbeam_channel::Sender<PathBuf>>,
    worker: Option<JoinHandle<()>>,
    pending: Arc<AtomicUsize>,
    suffix: String,
}

impl CompressionPipeline {
    /// Spawn the worker thread that owns `compressor`
    pub fn spawn(compressor: Box<dyn Compressor>, suffix: &str) -> Result<Self> {
        let suffix = normalize_suffix(suffix);
        if suffix.is_empty() {
            return Err(Error::config("compressed suffix must not be empty"));
        }

        let (tx, rx) = crossbeam_channel::unbounded::<PathBuf>();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = {
            let pending = Arc::clone(&pending);
            let suffix = suffix.clone();
            let mut compressor = compressor;
            thread::Builder::new()
                .name(constants::COMPRESS_THREAD_NAME.to_string())
                .spawn(move || {
                    for backup in rx.iter() {
                        run_job(compressor.as_mut(), &backup, &suffix);
                        pending.fetch_sub(1, Ordering::SeqCst);
                    }
                    debug!("Compression worker exiting");
                })?
        };

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            pending,
            suffix,
        })
    }

    /// Queue a backup for compression. Returns false if it was not queued.
    pub fn submit(&self, backup: PathBuf) -> bool {
        let Some(tx) = &self.tx else {
            warn!("Compression pipeline drained, leaving {} uncompressed", backup.display());
            return false;
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = tx.send(backup) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("Compression worker gone, leaving {} uncompressed", e.0.display());
            return false;
        }
        true
    }

    /// Jobs queued or running
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Suffix appended to compressed backups
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Stop accepting jobs and wait for the queue to empty
    pub fn drain(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Compression worker panicked");
            }
        }
    }
}

impl Drop for CompressionPipeline {
    fn drop(&mut self) {
        self.drain();
    }
}
