//! RIFF/WAVE header parsing, validation and construction.
//!
//! The header is the only thing a stream needs before playback can start:
//! it fixes the sample format, channel count and rate the output device is
//! opened with, and tells the consumer how many bytes to skip before the
//! PCM payload.
//!
//! # Example
//!
//! ```rust
//! use remote_audio::wav::{WavHeader, WavSpec};
//!
//! let header = WavHeader::synthesize(1024, WavSpec::default());
//! let bytes = header.construct();
//!
//! let parsed = WavHeader::from_bytes(&bytes).unwrap();
//! assert!(parsed.is_valid());
//! assert_eq!(parsed.header_size(), Ok(44));
//! assert_eq!(parsed.data_size(), Ok(1024));
//! ```

pub mod error;
pub mod header;

pub use error::{WavFormatError, WavResult};
pub use header::{ExtensibleFormat, FmtExtension, WavHeader, WavSpec};

use serde::{Deserialize, Serialize};

/// Size of the canonical PCM header (`Subchunk1Size == 16`).
pub const WAV_MIN_HEADER_SIZE: usize = 44;

/// Size of a header carrying the 2-byte extension size field (`Subchunk1Size == 18`).
pub const WAV_EXTENDED_HEADER_SIZE: usize = 46;

/// Size of a `WAVE_FORMAT_EXTENSIBLE` header (`Subchunk1Size == 40`).
pub const WAV_EXTENSIBLE_HEADER_SIZE: usize = 68;

/// Largest value the 32-bit `ChunkSize` field can hold.
pub const WAV_MAX_CHUNK_SIZE: u32 = u32::MAX;

/// Largest data chunk representable in a canonical header.
///
/// Used as the declared size when the payload length is unknown at the time
/// the header is written, e.g. for a live transcoder.
pub const WAV_MAX_DATA_SIZE: u32 = WAV_MAX_CHUNK_SIZE - 36;

/// The `AudioFormat` code stored at offset 20 of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioFormat {
    /// Integer PCM (`1`)
    Pcm,
    /// IEEE 754 float (`3`)
    IeeeFloat,
    /// ITU G.711 a-law (`6`)
    ALaw,
    /// ITU G.711 mu-law (`7`)
    MuLaw,
    /// `WAVE_FORMAT_EXTENSIBLE` (`0xFFFE`); the real format lives in the sub-format GUID
    Extensible,
    /// Any other registered or vendor code
    Other(u16),
}

impl AudioFormat {
    /// The numeric code as stored in the header.
    pub const fn code(self) -> u16 {
        match self {
            Self::Pcm => 0x0001,
            Self::IeeeFloat => 0x0003,
            Self::ALaw => 0x0006,
            Self::MuLaw => 0x0007,
            Self::Extensible => 0xFFFE,
            Self::Other(code) => code,
        }
    }

    /// Natural `Subchunk1Size` for headers of this format.
    pub const fn default_subchunk1_size(self) -> u32 {
        match self {
            Self::Pcm => 16,
            Self::Extensible => 40,
            _ => 18,
        }
    }
}

impl From<u16> for AudioFormat {
    fn from(code: u16) -> Self {
        match code {
            0x0001 => Self::Pcm,
            0x0003 => Self::IeeeFloat,
            0x0006 => Self::ALaw,
            0x0007 => Self::MuLaw,
            0xFFFE => Self::Extensible,
            other => Self::Other(other),
        }
    }
}

impl From<AudioFormat> for u16 {
    fn from(format: AudioFormat) -> Self {
        format.code()
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pcm => write!(f, "PCM"),
            Self::IeeeFloat => write!(f, "IEEE float"),
            Self::ALaw => write!(f, "A-law"),
            Self::MuLaw => write!(f, "mu-law"),
            Self::Extensible => write!(f, "extensible"),
            Self::Other(code) => write!(f, "0x{code:04X}"),
        }
    }
}
