//! Streaming infrastructure: the shared buffer, its producers, and the
//! status and lifecycle of the stream that consumes it.
//!
//! # Data flow
//!
//! ```text
//! file / HTTP / transcoder ──(background thread)──▶ StreamIO ──▶ WavStreamCallback ──▶ device
//!                                                       │                │
//!                                                       └── StreamStatus ◀┘
//! ```
//!
//! A producer from [`sources`] seeds a [`StreamIO`] with at least a complete
//! WAV header and keeps appending on its own thread. The consumer strips
//! the header with [`read_header`], then a [`WavStreamCallback`] pulls whole
//! frames and reports them to a [`StreamStatus`], which an [`AudioStream`]
//! polls to decide when playback is finished.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use remote_audio::streaming::{StreamIO, StreamStatus, WavStreamCallback, read_header};
//! use remote_audio::wav::{WavHeader, WavSpec};
//!
//! let mut bytes = WavHeader::synthesize(8, WavSpec::default()).construct();
//! bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
//! let io = Arc::new(StreamIO::with_initial(&bytes, Some(8)));
//!
//! let header = read_header(&io).unwrap();
//! let status = Arc::new(StreamStatus::live(Arc::clone(&io), None));
//! let mut callback = WavStreamCallback::new(io, Arc::clone(&status), &header).unwrap();
//!
//! let (data, _) = callback.pull(2);
//! assert_eq!(data, [1, 2, 3, 4, 5, 6, 7, 8]);
//! assert_eq!(status.completed(), Some(true));
//! ```

pub mod buffers;
pub mod callback;
pub mod sources;
pub mod status;
pub mod stream;
pub mod traits;

#[cfg(test)]
mod tests;

pub use buffers::{AwaitConfig, StreamIO};
pub use callback::{CallbackFlow, WavStreamCallback, read_header};
pub use status::{BytesTotal, DEFAULT_TIMEOUT, StreamState, StreamStatus};
pub use stream::{AudioStream, POLL_INTERVAL};
pub use traits::PlaybackHandle;
