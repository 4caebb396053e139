//! Buffer management for streaming audio.
//!
//! [`StreamIO`] is a growable byte buffer that one producer thread appends to
//! while one consumer (usually the device callback) drains it from the front.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Consumed bytes are only dropped from the front once at least this many have accumulated.
const COMPACT_THRESHOLD: usize = 64 * 1024;

/// Polling parameters for [`StreamIO::await_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwaitConfig {
    /// Number of bytes that must have been written
    pub size: u64,

    /// Give up after this long
    pub timeout: Duration,

    /// Sleep between checks
    pub interval: Duration,
}

impl Default for AwaitConfig {
    fn default() -> Self {
        Self {
            size: 1024,
            timeout: Duration::from_secs(3),
            interval: Duration::from_millis(200),
        }
    }
}

impl AwaitConfig {
    /// Wait for `size` bytes with the default timeout and interval.
    pub fn bytes(size: u64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

struct BufferState {
    data: Vec<u8>,
    cursor: usize,
    bytes_read: u64,
}

impl BufferState {
    fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    fn take(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.cursor..self.cursor + n]);
        self.cursor += n;
        self.bytes_read += n as u64;
        self.compact();
        n
    }

    fn compact(&mut self) {
        if self.cursor >= COMPACT_THRESHOLD && self.cursor * 2 >= self.data.len() {
            self.data.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}

/// A thread-safe byte buffer with independent write and read ends.
///
/// Writes always append to the logical end and never move the read
/// cursor; reads return whatever is available from the cursor and never
/// wait for more. A single lock guards both, so no reader can observe a
/// partially applied write.
///
/// `bytes_written` counts every byte ever appended and keeps growing after
/// reads have released memory. `bytes_total` is the final size the producer
/// expects to deliver, when it knows it.
pub struct StreamIO {
    state: Mutex<BufferState>,
    bytes_written: AtomicU64,
    bytes_total: Mutex<Option<u64>>,
}

impl StreamIO {
    /// Create an empty buffer with no declared total.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BufferState {
                data: Vec::new(),
                cursor: 0,
                bytes_read: 0,
            }),
            bytes_written: AtomicU64::new(0),
            bytes_total: Mutex::new(None),
        }
    }

    /// Create a buffer seeded with `initial_bytes`.
    ///
    /// The seed counts towards `bytes_written` like any other write.
    pub fn with_initial(initial_bytes: &[u8], bytes_total: Option<u64>) -> Self {
        let io = Self::new();
        io.set_bytes_total(bytes_total);
        if !initial_bytes.is_empty() {
            io.write(initial_bytes);
        }
        io
    }

    /// Append `bytes` to the end of the buffer, returning the number appended.
    pub fn write(&self, bytes: &[u8]) -> usize {
        let mut state = self.state.lock();
        state.data.extend_from_slice(bytes);
        self.bytes_written
            .fetch_add(bytes.len() as u64, Ordering::AcqRel);
        bytes.len()
    }

    /// Read up to `n` bytes from the cursor.
    ///
    /// Returns an empty vector when nothing is buffered.
    pub fn read(&self, n: usize) -> Vec<u8> {
        let mut state = self.state.lock();
        let mut out = vec![0u8; n.min(state.remaining())];
        state.take(&mut out);
        out
    }

    /// Read everything currently buffered.
    pub fn read_all(&self) -> Vec<u8> {
        self.read(usize::MAX)
    }

    /// Fill as much of `buf` as is available, returning the number of bytes copied.
    pub fn read_into(&self, buf: &mut [u8]) -> usize {
        self.state.lock().take(buf)
    }

    /// Total number of bytes ever written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Acquire)
    }

    /// Total number of bytes ever read.
    pub fn position(&self) -> u64 {
        self.state.lock().bytes_read
    }

    /// Bytes written but not yet read.
    pub fn available(&self) -> usize {
        self.state.lock().remaining()
    }

    /// Whether there is nothing left to read right now.
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Final size the producer expects to deliver, if known.
    pub fn bytes_total(&self) -> Option<u64> {
        *self.bytes_total.lock()
    }

    /// Declare (or clear) the final size.
    pub fn set_bytes_total(&self, bytes_total: Option<u64>) {
        *self.bytes_total.lock() = bytes_total;
    }

    /// Block until `config.size` bytes have been written or `config.timeout` elapses.
    ///
    /// `on_tick` is called with the buffer and its current `bytes_written`
    /// before every sleep. Returns whether the target was reached.
    pub fn await_data<F>(&self, config: &AwaitConfig, mut on_tick: F) -> bool
    where
        F: FnMut(&StreamIO, u64),
    {
        let deadline = Instant::now() + config.timeout;

        loop {
            let written = self.bytes_written();
            if written >= config.size {
                return true;
            }
            if Instant::now() >= deadline {
                tracing::debug!(
                    written,
                    target = config.size,
                    "Timed out waiting for buffered data"
                );
                return false;
            }
            on_tick(self, written);
            std::thread::sleep(config.interval);
        }
    }
}

impl Default for StreamIO {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamIO {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamIO")
            .field("available", &self.available())
            .field("bytes_written", &self.bytes_written())
            .field("bytes_total", &self.bytes_total())
            .finish()
    }
}

impl io::Read for &StreamIO {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(StreamIO::read_into(*self, buf))
    }
}

impl io::Write for &StreamIO {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(StreamIO::write(*self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
