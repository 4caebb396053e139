// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![cfg_attr(not(test), warn(clippy::unwrap_used))] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(missing_docs)]

//! # remote_audio
//!
//! Stream WAV audio from local files, HTTP servers or an external
//! transcoder to an output device while it is still arriving.
//!
//! ## Overview
//!
//! A producer thread appends bytes to a shared [`StreamIO`] buffer as they
//! arrive. The device callback drains it from the front, one frame-aligned
//! chunk at a time, and reports progress to a [`StreamStatus`]. Playback
//! ends when every declared byte has been played, when no data has arrived
//! for the configured timeout, or when the caller stops it.
//!
//! ## Features
//!
//! - `playback` (default): CPAL output devices, see [`playback`]
//! - `http` (default): HTTP(S) sources via `reqwest`
//!
//! Without `playback` the crate still parses and builds WAV headers and
//! runs the buffer, status and producers, which is enough to feed any
//! other sink.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use remote_audio::streaming::{StreamIO, read_header};
//! use remote_audio::wav::{WavHeader, WavSpec};
//!
//! let spec = WavSpec::s16le(1, 8000);
//! let mut bytes = WavHeader::synthesize(4, spec).construct();
//! bytes.extend_from_slice(&[0, 1, 0, 2]);
//!
//! let io = Arc::new(StreamIO::with_initial(&bytes, Some(4)));
//! let header = read_header(&io)?;
//! assert_eq!(header.sample_rate, 8000);
//! assert_eq!(io.read_all(), [0, 1, 0, 2]);
//! # Ok::<(), remote_audio::RemoteAudioError>(())
//! ```

mod error;
mod utils;

#[cfg(feature = "playback")]
pub mod playback;
pub mod streaming;
pub mod wav;

pub use crate::error::{RemoteAudioError, RemoteAudioResult};
pub use crate::streaming::{
    AudioStream, BytesTotal, CallbackFlow, PlaybackHandle, StreamIO, StreamState, StreamStatus,
    WavStreamCallback,
};
pub use crate::wav::{AudioFormat, WavFormatError, WavHeader, WavSpec};

#[cfg(feature = "playback")]
pub use crate::playback::{DeviceManager, DeviceSelector, PlaybackConfig};
