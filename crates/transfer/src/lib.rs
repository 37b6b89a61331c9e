//! Chunked file reading and upload progress accounting.
//!
//! Files are split into fixed-size chunks that are uploaded one after
//! another; [`ChunkProgress`] turns "chunk sent" events into the progress
//! fractions reported to callers.

mod chunked;
mod progress;

pub use chunked::{Chunk, ChunkReader, total_chunks};
pub use progress::{ChunkProgress, SpeedCalculator, UploadProgress};

/// Default chunk size: 100 000 bytes.
///
/// Tableau accepts append requests up to 64 MB, but small chunks keep
/// progress reporting and cancellation responsive.
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file changed while reading: expected {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },
}
