//! Liveness tracking for a playing stream.
//!
//! A [`StreamStatus`] is shared between the device callback, which reports
//! how many bytes it handed to the device, and the controlling thread, which
//! polls it to decide when playback is over.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::buffers::StreamIO;

/// Inactivity timeout applied when a stream has neither a known size nor an
/// explicit timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the expected number of payload bytes comes from.
#[derive(Debug, Clone, Default)]
pub enum BytesTotal {
    /// Size is not known up front.
    #[default]
    Unknown,
    /// Size was known when the stream was opened.
    Fixed(u64),
    /// Size is whatever the producer behind this buffer eventually declares.
    Live(Arc<StreamIO>),
}

impl BytesTotal {
    /// Current value, if one has been declared.
    pub fn get(&self) -> Option<u64> {
        match self {
            Self::Unknown => None,
            Self::Fixed(total) => Some(*total),
            Self::Live(io) => io.bytes_total(),
        }
    }

    /// Whether no source of a total was given at all.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<u64> for BytesTotal {
    fn from(total: u64) -> Self {
        Self::Fixed(total)
    }
}

impl From<Option<u64>> for BytesTotal {
    fn from(total: Option<u64>) -> Self {
        total.map_or(Self::Unknown, Self::Fixed)
    }
}

/// Coarse view of where a stream is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Still expecting data.
    Live,
    /// Every expected byte was played.
    Completed,
    /// No data arrived within the timeout.
    TimedOut,
    /// Deactivated by the controller.
    Stopped,
}

impl StreamState {
    /// Whether the stream should keep running.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

/// Tracks bytes played against an expected total and time since the last
/// data, and derives from them whether a stream is still live.
///
/// All counters are atomics so the device callback can update them without
/// taking a lock while the controller reads them.
#[derive(Debug)]
pub struct StreamStatus {
    active: AtomicBool,
    bytes_played: AtomicU64,
    bytes_total: BytesTotal,
    io: Option<Arc<StreamIO>>,
    timeout: Option<Duration>,
    origin: Instant,
    /// Nanoseconds after `origin` at which data was last played.
    last_data: AtomicU64,
}

impl StreamStatus {
    /// Create a status for a stream.
    ///
    /// When `bytes_total` is [`BytesTotal::Unknown`] and `io` is given, the
    /// total is read live from the buffer. If that still leaves no total and
    /// no timeout, [`DEFAULT_TIMEOUT`] is used so the stream cannot stay
    /// live forever.
    pub fn new(
        timeout: Option<Duration>,
        io: Option<Arc<StreamIO>>,
        bytes_total: BytesTotal,
    ) -> Self {
        let bytes_total = match (bytes_total, &io) {
            (BytesTotal::Unknown, Some(io)) => BytesTotal::Live(Arc::clone(io)),
            (total, _) => total,
        };

        let timeout = match timeout {
            None if bytes_total.is_unknown() => {
                tracing::warn!(
                    timeout_secs = DEFAULT_TIMEOUT.as_secs_f64(),
                    "Stream has neither a total size nor a timeout, using default timeout"
                );
                Some(DEFAULT_TIMEOUT)
            }
            other => other,
        };

        Self {
            active: AtomicBool::new(true),
            bytes_played: AtomicU64::new(0),
            bytes_total,
            io,
            timeout,
            origin: Instant::now(),
            last_data: AtomicU64::new(0),
        }
    }

    /// Status for a stream of known size.
    pub fn fixed(bytes_total: u64, timeout: Option<Duration>) -> Self {
        Self::new(timeout, None, BytesTotal::Fixed(bytes_total))
    }

    /// Status that follows the size declared by `io`'s producer.
    pub fn live(io: Arc<StreamIO>, timeout: Option<Duration>) -> Self {
        Self::new(timeout, Some(io), BytesTotal::Unknown)
    }

    /// Record that `bytes` were handed to the device.
    ///
    /// Any non-zero amount also resets the inactivity timer.
    pub fn played(&self, bytes: usize) {
        if bytes == 0 {
            return;
        }
        self.bytes_played.fetch_add(bytes as u64, Ordering::AcqRel);
        self.touch();
    }

    /// Reset the inactivity timer without counting any bytes.
    pub fn touch(&self) {
        let now = self.origin.elapsed().as_nanos().min(u64::MAX as u128) as u64;
        self.last_data.store(now, Ordering::Release);
    }

    /// Activate or deactivate the stream.
    pub fn set(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Deactivate the stream.
    pub fn stop(&self) {
        self.set(false);
    }

    /// Whether the controller still considers the stream active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Whether every expected byte has been played.
    ///
    /// `None` while no total is known.
    pub fn completed(&self) -> Option<bool> {
        self.bytes_total().map(|total| self.bytes_played() >= total)
    }

    /// Whether the time since the last played data has reached the timeout.
    ///
    /// `None` when the stream has no timeout.
    pub fn timed_out(&self) -> Option<bool> {
        self.timeout.map(|timeout| self.since_last_data() >= timeout)
    }

    /// Current state, checked in the order stopped, completed, timed out.
    pub fn state(&self) -> StreamState {
        if !self.is_active() {
            StreamState::Stopped
        } else if self.completed() == Some(true) {
            StreamState::Completed
        } else if self.timed_out() == Some(true) {
            StreamState::TimedOut
        } else {
            StreamState::Live
        }
    }

    /// Active, not completed and not timed out.
    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }

    /// Bytes reported through [`played`](Self::played).
    pub fn bytes_played(&self) -> u64 {
        self.bytes_played.load(Ordering::Acquire)
    }

    /// Expected payload size, if known.
    pub fn bytes_total(&self) -> Option<u64> {
        self.bytes_total.get()
    }

    /// Bytes the producer has written into the attached buffer.
    pub fn bytes_written(&self) -> Option<u64> {
        self.io.as_ref().map(|io| io.bytes_written())
    }

    /// Bytes sitting unread in the attached buffer.
    ///
    /// Measured from the read position rather than as written minus played,
    /// so a header the consumer has already stripped is not counted.
    pub fn bytes_buffered(&self) -> Option<u64> {
        self.io.as_ref().map(|io| io.available() as u64)
    }

    /// The inactivity timeout in effect.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Time since data was last played, or since creation if none was.
    pub fn since_last_data(&self) -> Duration {
        let last = Duration::from_nanos(self.last_data.load(Ordering::Acquire));
        self.origin.elapsed().saturating_sub(last)
    }

    /// The buffer this status watches, if any.
    pub fn io(&self) -> Option<&Arc<StreamIO>> {
        self.io.as_ref()
    }
}
