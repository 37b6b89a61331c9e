use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// A contiguous slice of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of this chunk in the file.
    pub index: u64,
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data. Only the final chunk may be shorter than the chunk size.
    pub data: Vec<u8>,
}

/// Number of chunks needed for `file_size` bytes. Zero for an empty file.
pub fn total_chunks(file_size: u64, chunk_size: usize) -> u64 {
    let chunk_size = effective_chunk_size(chunk_size) as u64;
    file_size.div_ceil(chunk_size)
}

fn effective_chunk_size(chunk_size: usize) -> usize {
    if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    }
}

/// Reads a file in fixed-size chunks.
pub struct ChunkReader {
    file: tokio::fs::File,
    chunk_size: usize,
    offset: u64,
    index: u64,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        let file_size = file.metadata().await?.len();
        Ok(Self {
            file,
            chunk_size: effective_chunk_size(chunk_size),
            offset: 0,
            index: 0,
            file_size,
        })
    }

    /// Reads the next chunk. Returns `None` at EOF.
    ///
    /// Each chunk is filled completely unless it is the last one, so short
    /// reads from the OS never produce undersized middle chunks.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let read_size = remaining.min(self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; read_size];
        let mut filled = 0;
        while filled < read_size {
            let n = self.file.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(TransferError::Truncated {
                    expected: self.file_size,
                    actual: self.offset + filled as u64,
                });
            }
            filled += n;
        }

        let chunk = Chunk {
            index: self.index,
            offset: self.offset,
            data: buf,
        };
        self.offset += read_size as u64;
        self.index += 1;
        Ok(Some(chunk))
    }

    /// Total file size in bytes, as seen when the file was opened.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.offset)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks this reader will yield in total.
    pub fn total_chunks(&self) -> u64 {
        total_chunks(self.file_size, self.chunk_size)
    }
}
