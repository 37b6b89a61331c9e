use std::time::{Duration, Instant};

use crate::chunked::total_chunks;

/// Snapshot of an upload after a chunk has been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    pub chunks_sent: u64,
    pub total_chunks: u64,
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Fraction of the upload completed, in `[0.0, 1.0]`.
    ///
    /// An upload with no chunks is complete by definition.
    pub fn fraction(&self) -> f64 {
        if self.total_chunks == 0 {
            return 1.0;
        }
        if self.chunks_sent >= self.total_chunks {
            return 1.0;
        }
        self.chunks_sent as f64 / self.total_chunks as f64
    }
}

/// Counts acknowledged chunks for a single upload.
#[derive(Debug, Clone)]
pub struct ChunkProgress {
    total_chunks: u64,
    total_bytes: u64,
    chunks_sent: u64,
    bytes_sent: u64,
}

impl ChunkProgress {
    pub fn new(file_size: u64, chunk_size: usize) -> Self {
        Self {
            total_chunks: total_chunks(file_size, chunk_size),
            total_bytes: file_size,
            chunks_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Records one more chunk of `len` bytes and returns the new snapshot.
    pub fn advance(&mut self, len: usize) -> UploadProgress {
        self.chunks_sent = (self.chunks_sent + 1).min(self.total_chunks);
        self.bytes_sent = (self.bytes_sent + len as u64).min(self.total_bytes);
        self.snapshot()
    }

    pub fn snapshot(&self) -> UploadProgress {
        UploadProgress {
            chunks_sent: self.chunks_sent,
            total_chunks: self.total_chunks,
            bytes_sent: self.bytes_sent,
            total_bytes: self.total_bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeedCalculator
// ---------------------------------------------------------------------------

struct SpeedSample {
    bytes: u64,
    timestamp: Instant,
}

/// Calculates transfer speed using a sliding window of samples.
pub struct SpeedCalculator {
    samples: Vec<SpeedSample>,
    max_samples: usize,
    window_size: Duration,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl SpeedCalculator {
    /// Creates a new calculator.
    ///
    /// - `window_size`: time window for speed calculation (default 5 s).
    /// - `max_samples`: maximum retained samples (default 100).
    pub fn new(window_size: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            samples: Vec::new(),
            max_samples: max_samples.unwrap_or(100),
            window_size: window_size.unwrap_or(Duration::from_secs(5)),
        }
    }

    /// Records `bytes` transferred at the current instant.
    pub fn add_sample(&mut self, bytes: u64) {
        self.add_sample_at(bytes, Instant::now());
    }

    fn add_sample_at(&mut self, bytes: u64, now: Instant) {
        self.samples.push(SpeedSample {
            bytes,
            timestamp: now,
        });

        if let Some(cutoff) = now.checked_sub(self.window_size) {
            self.samples.retain(|sample| sample.timestamp >= cutoff);
        }

        if self.samples.len() > self.max_samples {
            let excess = self.samples.len() - self.max_samples;
            self.samples.drain(..excess);
        }
    }

    /// Average speed in bytes/second within the window.
    ///
    /// Returns 0.0 with fewer than 2 samples.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return 0.0;
        };
        let elapsed = last.timestamp.duration_since(first.timestamp);
        if self.samples.len() < 2 || elapsed.is_zero() {
            return 0.0;
        }

        // The first sample marks the window start; its bytes predate it.
        let bytes: u64 = self.samples[1..].iter().map(|s| s.bytes).sum();
        bytes as f64 / elapsed.as_secs_f64()
    }

    /// Estimates time remaining to transfer `remaining_bytes`.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining_bytes as f64 / speed))
    }
}
