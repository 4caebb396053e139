//! Error types for WAV header parsing and validation.

use thiserror::Error;

/// Result type for WAV header operations
pub type WavResult<T> = Result<T, WavFormatError>;

/// Describes why a RIFF/WAVE header could not be decoded or failed validation.
///
/// The error is `Clone` so a validation failure can be handed back from every
/// size accessor of an invalid header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WavFormatError {
    /// Not enough bytes to decode the header.
    #[error("Header too short: needed {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },

    /// A four character tag did not hold the expected value.
    #[error("Invalid {field}: expected {expected:?}, found {actual:?}")]
    InvalidTag {
        field: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// `Subchunk1Size` is not one of the layouts this crate understands.
    #[error("Unsupported Subchunk1Size {0}, expected one of 16, 18 or 40")]
    UnsupportedSubchunk1Size(u32),

    /// `BlockAlign` disagrees with `NumChannels * BitsPerSample / 8`.
    #[error("BlockAlign {actual} does not match expected {expected}")]
    BlockAlignMismatch { expected: u32, actual: u16 },

    /// `ByteRate` disagrees with `SampleRate * BlockAlign`.
    #[error("ByteRate {actual} does not match expected {expected}")]
    ByteRateMismatch { expected: u64, actual: u32 },

    /// Samples are not a whole number of bytes.
    #[error("BitsPerSample {0} is not a multiple of 8")]
    BitsPerSampleNotByteAligned(u16),

    /// `ChunkSize - Subchunk2Size` disagrees with `Subchunk1Size + 20`.
    #[error(
        "ChunkSize {chunk_size} minus Subchunk2Size {subchunk2_size} should equal Subchunk1Size {subchunk1_size} + 20"
    )]
    ChunkSizeMismatch {
        chunk_size: u32,
        subchunk1_size: u32,
        subchunk2_size: u32,
    },
}

impl WavFormatError {
    /// Create an invalid tag error from the raw bytes found in the header.
    pub fn invalid_tag(field: &'static str, expected: &'static str, actual: &[u8; 4]) -> Self {
        Self::InvalidTag {
            field,
            expected,
            actual: String::from_utf8_lossy(actual).into_owned(),
        }
    }
}
