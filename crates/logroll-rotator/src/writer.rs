//! Log writer with size-triggered rotation

use logroll_core::{normalize_suffix, CompressionKind, Error, Result, RotatorConfig};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::compress::{CompressionPipeline, Compressor, GzipCompressor};
use crate::rotation::{backup_path, next_sequence, prune_backups};

/// Appends to an active log file and rotates it into numbered backups.
///
/// A rotator has a single logical writer: `Write` and [`Rotator::run`] both
/// take `&mut self` and must not be mixed on the same instance. Only
/// compression happens off the caller's thread.
pub struct Rotator {
    path: PathBuf,
    file: Option<File>,
    current_size: u64,
    threshold: u64,
    max_backups: usize,
    tee: bool,
    tee_sink: Box<dyn Write + Send>,
    suffix: String,
    compression: Option<CompressionPipeline>,
    #[cfg(test)]
    fail_reopen: bool,
}

impl Rotator {
    /// Create a rotator with gzip compression.
    ///
    /// `threshold_kb` is multiplied by 1000. A `max_backups` of zero or less
    /// keeps every backup.
    pub fn new(path: impl Into<PathBuf>, threshold_kb: u64, tee: bool, max_backups: i64) -> Result<Self> {
        Self::from_config(
            RotatorConfig::new(path)
                .threshold_kb(threshold_kb)
                .tee(tee)
                .max_backups_signed(max_backups),
        )
    }

    /// Create a rotator from a full config
    pub fn from_config(config: RotatorConfig) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_active(&config.path)?;
        let current_size = file.metadata()?.len();
        let suffix = config.compressed_suffix();

        let compression = match config.compression {
            CompressionKind::Gzip => Some(CompressionPipeline::spawn(
                Box::new(GzipCompressor::with_level(config.gzip_level)),
                &suffix,
            )?),
            CompressionKind::None => None,
        };

        debug!(
            "Opened {} ({} bytes, threshold {} bytes, compression {})",
            config.path.display(),
            current_size,
            config.threshold_bytes(),
            config.compression
        );

        Ok(Self {
            threshold: config.threshold_bytes(),
            path: config.path,
            file: Some(file),
            current_size,
            max_backups: config.max_backups,
            tee: config.tee,
            tee_sink: Box::new(io::stdout()),
            suffix,
            compression,
            #[cfg(test)]
            fail_reopen: false,
        })
    }

    /// Replace the backup compressor. `None` disables compression.
    ///
    /// Call before writing; a previous compressor is drained first. With
    /// `None` an empty suffix keeps the current one, so existing compressed
    /// backups are still seen when numbering.
    pub fn set_compressor(&mut self, compressor: Option<Box<dyn Compressor>>, suffix: &str) -> Result<()> {
        self.compression = None;
        let suffix = normalize_suffix(suffix);
        match compressor {
            Some(compressor) => {
                self.compression = Some(CompressionPipeline::spawn(compressor, &suffix)?);
                self.suffix = suffix;
            }
            None if suffix.is_empty() => {}
            None => self.suffix = suffix,
        }
        Ok(())
    }

    /// Replace stdout as the tee target
    pub fn set_tee_sink(&mut self, sink: Box<dyn Write + Send>) {
        self.tee_sink = sink;
    }

    /// Get the active log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get current file size
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Get the rotation threshold in bytes
    pub fn threshold_bytes(&self) -> u64 {
        self.threshold
    }

    /// Compression jobs queued or running
    pub fn pending_compressions(&self) -> usize {
        self.compression.as_ref().map_or(0, |p| p.pending())
    }

    /// Consume `reader` line by line until it fails or runs dry.
    ///
    /// Lines are appended as they arrive, partial ones included, but rotation
    /// is only considered after a newline. Bytes are written verbatim: CRLF
    /// endings are kept and a final unterminated line gets no `\n` added,
    /// unlike line readers that re-terminate each line. End of input is
    /// reported as [`Error::EndOfInput`].
    pub fn run<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        self.begin_stream()?;

        loop {
            let chunk = match reader.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if chunk.is_empty() {
                return Err(Error::EndOfInput);
            }
            let consumed = self.ingest(chunk)?;
            reader.consume(consumed);
        }
    }

    /// Rotate eagerly if the file is already over threshold
    pub(crate) fn begin_stream(&mut self) -> Result<()> {
        if self.current_size >= self.threshold {
            debug!("{} already at threshold, rotating before intake", self.path.display());
            self.rotate()?;
        }
        Ok(())
    }

    /// Append `chunk` up to and including its first newline.
    /// Returns the number of bytes taken from `chunk`.
    pub(crate) fn ingest(&mut self, chunk: &[u8]) -> Result<usize> {
        let (line, complete) = match chunk.iter().position(|&b| b == b'\n') {
            Some(end) => (&chunk[..=end], true),
            None => (chunk, false),
        };

        self.append_all(line)?;
        if complete {
            self.rotate_if_needed()?;
        }
        Ok(line.len())
    }

    /// Rotate the log file, returning the new backup's path
    pub fn rotate(&mut self) -> Result<PathBuf> {
        let seq = next_sequence(&self.path, &self.suffix)?;
        let backup = backup_path(&self.path, seq);
        debug!("Rotating log file: {} -> {}", self.path.display(), backup.display());

        let file = self
            .file
            .take()
            .ok_or_else(|| Error::NoActiveFile(self.path.clone()))?;
        let closed = file.sync_all();
        drop(file);
        closed.map_err(|e| Error::rotation(&self.path, e))?;

        fs::rename(&self.path, &backup).map_err(|e| Error::rotation(&self.path, e))?;

        let pruned = prune_backups(&self.path, seq, self.max_backups, &self.suffix);
        if !pruned.is_empty() {
            debug!("Pruned {} old backup(s) of {}", pruned.len(), self.path.display());
        }

        let file = self.reopen().map_err(|e| Error::rotation(&self.path, e))?;
        self.file = Some(file);
        self.current_size = 0;
        info!("Rotated {} to {}", self.path.display(), backup.display());

        if let Some(pipeline) = &self.compression {
            pipeline.submit(backup.clone());
        }

        Ok(backup)
    }

    /// Close the active file and wait for queued compression to finish
    pub fn close(mut self) -> Result<()> {
        let closed = match self.file.take() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        };

        if let Some(mut pipeline) = self.compression.take() {
            pipeline.drain();
        }
        if self.tee {
            let _ = self.tee_sink.flush();
        }

        closed.map_err(Error::from)
    }

    fn reopen(&self) -> io::Result<File> {
        #[cfg(test)]
        if self.fail_reopen {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "reopen refused"));
        }
        open_active(&self.path)
    }

    fn rotate_if_needed(&mut self) -> Result<()> {
        if self.current_size >= self.threshold {
            self.rotate()?;
        }
        Ok(())
    }

    fn active(&mut self) -> Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| Error::NoActiveFile(self.path.clone()))
    }

    fn append(&mut self, bytes: &[u8]) -> Result<usize> {
        let written = self.active()?.write(bytes)?;
        self.account(&bytes[..written]);
        Ok(written)
    }

    fn append_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.active()?.write_all(bytes)?;
        self.account(bytes);
        Ok(())
    }

    fn account(&mut self, written: &[u8]) {
        self.current_size += written.len() as u64;
        if self.tee {
            // Tee is best-effort
            let _ = self.tee_sink.write_all(written);
        }
    }
}

impl Write for Rotator {
    /// Appends `buf`; rotates afterwards when over threshold and the written
    /// bytes end with a newline.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.append(buf)?;
        if buf[..written].ends_with(b"\n") {
            self.rotate_if_needed()?;
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.tee {
            let _ = self.tee_sink.flush();
        }
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn open_active(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
