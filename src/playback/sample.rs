//! Conversion from WAV payload bytes to the `f32` samples CPAL plays.

use crate::error::{RemoteAudioError, RemoteAudioResult};
use crate::wav::{AudioFormat, WavHeader};

const I24_SCALE: f32 = 8_388_608.0;

/// Little-endian sample layouts that can be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDecoder {
    /// Unsigned 8-bit PCM
    U8,
    /// Signed 16-bit PCM
    I16,
    /// Signed 24-bit PCM, packed in 3 bytes
    I24,
    /// Signed 32-bit PCM
    I32,
    /// 32-bit IEEE float
    F32,
    /// 64-bit IEEE float
    F64,
}

impl SampleDecoder {
    /// Pick the decoder for the payload described by `header`.
    pub fn for_header(header: &WavHeader) -> RemoteAudioResult<Self> {
        let encoding = header.sample_encoding();
        match (encoding, header.bits_per_sample) {
            (AudioFormat::Pcm, 8) => Ok(Self::U8),
            (AudioFormat::Pcm, 16) => Ok(Self::I16),
            (AudioFormat::Pcm, 24) => Ok(Self::I24),
            (AudioFormat::Pcm, 32) => Ok(Self::I32),
            (AudioFormat::IeeeFloat, 32) => Ok(Self::F32),
            (AudioFormat::IeeeFloat, 64) => Ok(Self::F64),
            (encoding, bits) => Err(RemoteAudioError::invalid_input(format!(
                "cannot play {bits}-bit {encoding} samples"
            ))),
        }
    }

    /// Bytes per single-channel sample.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 => 2,
            Self::I24 => 3,
            Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Decode as many whole samples of `bytes` as fit in `out`.
    ///
    /// Returns the number of samples written.
    pub fn decode(self, bytes: &[u8], out: &mut [f32]) -> usize {
        let width = self.bytes_per_sample();
        let mut written = 0;
        for (sample, raw) in out.iter_mut().zip(bytes.chunks_exact(width)) {
            *sample = self.decode_one(raw);
            written += 1;
        }
        written
    }

    fn decode_one(self, raw: &[u8]) -> f32 {
        match self {
            Self::U8 => (f32::from(raw[0]) - 128.0) / 128.0,
            Self::I16 => f32::from(i16::from_le_bytes([raw[0], raw[1]])) / 32_768.0,
            Self::I24 => (i32::from_le_bytes([0, raw[0], raw[1], raw[2]]) >> 8) as f32 / I24_SCALE,
            Self::I32 => {
                (f64::from(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])) / 2_147_483_648.0)
                    as f32
            }
            Self::F32 => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            Self::F64 => f64::from_le_bytes([
                raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
            ]) as f32,
        }
    }
}
