//! Async log capture from pipes and child process output

use logroll_core::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::writer::Rotator;

/// Feed `reader` into `rotator` until EOF, returning the bytes consumed.
///
/// Uses the same line gating as [`Rotator::run`], but a clean EOF ends the
/// capture successfully instead of being reported as an error. File writes
/// and rotation run inline on the calling task.
pub async fn capture<R>(rotator: &mut Rotator, mut reader: R) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    rotator.begin_stream()?;

    let mut total = 0u64;
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            break;
        }
        let consumed = rotator.ingest(chunk)?;
        reader.consume(consumed);
        total += consumed as u64;
    }

    debug!("Capture into {} ended after {} bytes", rotator.path().display(), total);
    Ok(total)
}
