//! Audio playback on output devices via CPAL.
//!
//! This module connects a [`StreamIO`](crate::streaming::StreamIO) carrying
//! a WAV byte stream to an output device:
//! - Device enumeration and selection by default, index or name
//! - Sample decoding from 8/16/24/32-bit PCM and 32/64-bit float to `f32`
//! - One-call playback of local files and URLs, transcoding non-WAV formats
//!
//! # Example
//!
//! ```rust,no_run
//! use remote_audio::playback::{DeviceManager, PlaybackConfig, play_file};
//!
//! # fn main() -> remote_audio::RemoteAudioResult<()> {
//! let manager = DeviceManager::new();
//! let stream = play_file(&manager, "take.wav", None, &PlaybackConfig::default())?;
//!
//! // Blocks until the file has played or the stream times out.
//! stream.finish();
//! # Ok(())
//! # }
//! ```

pub mod devices;
pub mod player;
pub mod sample;

pub use devices::{DeviceInfo, DeviceManager, DeviceSelector};
#[cfg(feature = "http")]
pub use player::play_http;
pub use player::{CpalHandle, DEFAULT_CHUNK_SIZE, PlaybackConfig, open_wav_stream, play_file};
pub use sample::SampleDecoder;
