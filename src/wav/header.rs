//! The [`WavHeader`] record: decoding, validation, size reporting and encoding.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AudioFormat, WAV_MAX_CHUNK_SIZE, WavFormatError, WavResult};
use crate::error::{RemoteAudioError, RemoteAudioResult};
use crate::utils::read_full;

const RIFF_TAG: [u8; 4] = *b"RIFF";
const WAVE_TAG: [u8; 4] = *b"WAVE";
const FMT_TAG: [u8; 4] = *b"fmt ";
const DATA_TAG: [u8; 4] = *b"data";

/// Bytes required before `Subchunk1Size` (and therefore the full layout) is known.
const LAYOUT_PROBE_SIZE: usize = 20;

/// Largest `fmt ` chunk the decoder will attempt to read.
const MAX_SUBCHUNK1_SIZE: u32 = 256;

/// GUID tail shared by all `KSDATAFORMAT_SUBTYPE_*` sub-formats.
const KSDATAFORMAT_GUID_TAIL: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

/// Fields present only in `WAVE_FORMAT_EXTENSIBLE` headers (`Subchunk1Size >= 40`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensibleFormat {
    /// Number of meaningful bits in each container sample
    pub valid_bits_per_sample: u16,
    /// Speaker position mask
    pub channel_mask: u32,
    /// Sub-format GUID, stored as raw little-endian bytes
    pub sub_format: [u8; 16],
}

impl ExtensibleFormat {
    /// Format code embedded in the first two bytes of the sub-format GUID.
    pub fn sub_format_code(&self) -> AudioFormat {
        AudioFormat::from(u16::from_le_bytes([self.sub_format[0], self.sub_format[1]]))
    }
}

/// The optional tail of the `fmt ` chunk (`Subchunk1Size >= 18`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmtExtension {
    /// Declared size of the extension in bytes
    pub size: u16,
    /// Extensible fields, present when `Subchunk1Size >= 40`
    pub extensible: Option<ExtensibleFormat>,
}

/// Parameters for synthesising a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavSpec {
    /// Format code; also decides the `fmt ` chunk layout
    pub audio_format: AudioFormat,
    /// Interleaved channel count
    pub num_channels: u16,
    /// Frames per second
    pub sample_rate: u32,
    /// Container bits per sample
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            audio_format: AudioFormat::Pcm,
            num_channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
        }
    }
}

impl WavSpec {
    /// Signed 16-bit little-endian PCM, the layout external transcoders are asked to emit.
    pub const fn s16le(num_channels: u16, sample_rate: u32) -> Self {
        Self {
            audio_format: AudioFormat::Pcm,
            num_channels,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    /// Bytes per interleaved frame, or `None` when a frame is wider than
    /// the 16-bit `BlockAlign` field can describe.
    pub const fn block_align(&self) -> Option<u16> {
        self.num_channels.checked_mul(self.bits_per_sample / 8)
    }
}

/// A decoded RIFF/WAVE header.
///
/// Decoding never fails on semantic problems: a header with a wrong tag or
/// inconsistent rates is still returned, and [`validate`](Self::validate)
/// reports what is wrong. The size accessors hand back that same error so a
/// caller can branch once on the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavHeader {
    /// `ChunkID`, should be `RIFF`
    pub chunk_id: [u8; 4],
    /// `ChunkSize`
    pub chunk_size: u32,
    /// `Format`, should be `WAVE`
    pub format: [u8; 4],
    /// `Subchunk1ID`, should be `fmt `
    pub subchunk1_id: [u8; 4],
    /// `Subchunk1Size`, one of 16, 18 or 40
    pub subchunk1_size: u32,
    /// `AudioFormat`
    pub audio_format: AudioFormat,
    /// `NumChannels`
    pub num_channels: u16,
    /// `SampleRate`
    pub sample_rate: u32,
    /// `ByteRate`
    pub byte_rate: u32,
    /// `BlockAlign`
    pub block_align: u16,
    /// `BitsPerSample`
    pub bits_per_sample: u16,
    /// Extension fields, present when `Subchunk1Size >= 18`
    pub extension: Option<FmtExtension>,
    /// `Subchunk2ID`, normally `data`
    pub subchunk2_id: [u8; 4],
    /// `Subchunk2Size`
    pub subchunk2_size: u32,
}

impl WavHeader {
    /// Decode a header from the start of `bytes`.
    ///
    /// `bytes` may be longer than the header (e.g. the first chunk of a
    /// download); only `Subchunk1Size + 28` bytes are consumed.
    pub fn from_bytes(bytes: &[u8]) -> WavResult<Self> {
        if bytes.len() < LAYOUT_PROBE_SIZE {
            return Err(WavFormatError::TooShort {
                needed: super::WAV_MIN_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let subchunk1_size = u32_at(bytes, 16);
        let header_size = layout_size(subchunk1_size)?;
        if bytes.len() < header_size {
            return Err(WavFormatError::TooShort {
                needed: header_size,
                actual: bytes.len(),
            });
        }

        let extension = (subchunk1_size >= 18).then(|| FmtExtension {
            size: u16_at(bytes, 36),
            extensible: (subchunk1_size >= 40).then(|| {
                let mut sub_format = [0u8; 16];
                sub_format.copy_from_slice(&bytes[44..60]);
                ExtensibleFormat {
                    valid_bits_per_sample: u16_at(bytes, 38),
                    channel_mask: u32_at(bytes, 40),
                    sub_format,
                }
            }),
        });

        let subchunk2_offset = subchunk1_size as usize + 20;

        Ok(Self {
            chunk_id: tag_at(bytes, 0),
            chunk_size: u32_at(bytes, 4),
            format: tag_at(bytes, 8),
            subchunk1_id: tag_at(bytes, 12),
            subchunk1_size,
            audio_format: AudioFormat::from(u16_at(bytes, 20)),
            num_channels: u16_at(bytes, 22),
            sample_rate: u32_at(bytes, 24),
            byte_rate: u32_at(bytes, 28),
            block_align: u16_at(bytes, 32),
            bits_per_sample: u16_at(bytes, 34),
            extension,
            subchunk2_id: tag_at(bytes, subchunk2_offset),
            subchunk2_size: u32_at(bytes, subchunk2_offset + 4),
        })
    }

    /// Decode a header from a reader, consuming exactly the header bytes.
    ///
    /// The reader is left positioned at the first byte of the data chunk.
    pub fn from_reader<R: Read>(reader: &mut R) -> RemoteAudioResult<Self> {
        let mut buf = vec![0u8; LAYOUT_PROBE_SIZE];
        let read = read_full(reader, &mut buf)?;
        if read < LAYOUT_PROBE_SIZE {
            return Err(WavFormatError::TooShort {
                needed: super::WAV_MIN_HEADER_SIZE,
                actual: read,
            }
            .into());
        }

        let header_size = layout_size(u32_at(&buf, 16))?;
        buf.resize(header_size, 0);
        let read = LAYOUT_PROBE_SIZE + read_full(reader, &mut buf[LAYOUT_PROBE_SIZE..])?;
        if read < header_size {
            return Err(WavFormatError::TooShort {
                needed: header_size,
                actual: read,
            }
            .into());
        }

        Ok(Self::from_bytes(&buf)?)
    }

    /// Decode the header of the file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> RemoteAudioResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| RemoteAudioError::file_io(path, e))?;
        Self::from_reader(&mut file).map_err(|err| match err {
            RemoteAudioError::Io(source) => RemoteAudioError::file_io(path, source),
            other => other,
        })
    }

    /// Build a minimal valid header for a payload of `data_size` bytes.
    ///
    /// Pass `0` (or [`WAV_MAX_DATA_SIZE`](super::WAV_MAX_DATA_SIZE)) when the
    /// payload length is not known yet and patch it later with
    /// [`with_data_size`](Self::with_data_size). Sizes that do not fit the
    /// 32-bit `ChunkSize` are clamped.
    ///
    /// A frame wider than `u16::MAX` bytes cannot be described; `BlockAlign`
    /// saturates and [`validate`](Self::validate) rejects the result.
    pub fn synthesize(data_size: u32, spec: WavSpec) -> Self {
        let subchunk1_size = spec.audio_format.default_subchunk1_size();
        let block_align = spec.block_align().unwrap_or(u16::MAX);

        let extension = match subchunk1_size {
            16 => None,
            40 => Some(FmtExtension {
                size: 22,
                extensible: Some(ExtensibleFormat {
                    valid_bits_per_sample: spec.bits_per_sample,
                    channel_mask: default_channel_mask(spec.num_channels),
                    sub_format: sub_format_guid(AudioFormat::Pcm),
                }),
            }),
            _ => Some(FmtExtension {
                size: 0,
                extensible: None,
            }),
        };

        let header = Self {
            chunk_id: RIFF_TAG,
            chunk_size: 0,
            format: WAVE_TAG,
            subchunk1_id: FMT_TAG,
            subchunk1_size,
            audio_format: spec.audio_format,
            num_channels: spec.num_channels,
            sample_rate: spec.sample_rate,
            byte_rate: spec.sample_rate.saturating_mul(u32::from(block_align)),
            block_align,
            bits_per_sample: spec.bits_per_sample,
            extension,
            subchunk2_id: DATA_TAG,
            subchunk2_size: 0,
        };

        header.with_data_size(data_size)
    }

    /// A header declaring the largest payload its layout can represent.
    pub fn synthesize_unbounded(spec: WavSpec) -> Self {
        Self::synthesize(u32::MAX, spec)
    }

    /// Copy of this header with `Subchunk2Size` (and `ChunkSize`) patched to `data_size`.
    pub fn with_data_size(&self, data_size: u32) -> Self {
        let overhead = self.subchunk1_size.saturating_add(20);
        let data_size = data_size.min(WAV_MAX_CHUNK_SIZE.saturating_sub(overhead));

        Self {
            chunk_size: data_size + overhead,
            subchunk2_size: data_size,
            ..self.clone()
        }
    }

    /// Encode the header back to its canonical byte layout.
    ///
    /// Extension fields are written only where `Subchunk1Size` makes room for
    /// them, so decoding then encoding reproduces the original header bytes.
    pub fn construct(&self) -> Vec<u8> {
        let subchunk1_size = self.subchunk1_size.max(16);
        let subchunk2_offset = subchunk1_size as usize + 20;

        let mut out = Vec::with_capacity(subchunk2_offset + 8);
        out.extend_from_slice(&self.chunk_id);
        out.extend_from_slice(&self.chunk_size.to_le_bytes());
        out.extend_from_slice(&self.format);
        out.extend_from_slice(&self.subchunk1_id);
        out.extend_from_slice(&subchunk1_size.to_le_bytes());
        out.extend_from_slice(&self.audio_format.code().to_le_bytes());
        out.extend_from_slice(&self.num_channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.byte_rate.to_le_bytes());
        out.extend_from_slice(&self.block_align.to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());

        if let Some(extension) = &self.extension {
            out.extend_from_slice(&extension.size.to_le_bytes());
            if let Some(extensible) = &extension.extensible {
                out.extend_from_slice(&extensible.valid_bits_per_sample.to_le_bytes());
                out.extend_from_slice(&extensible.channel_mask.to_le_bytes());
                out.extend_from_slice(&extensible.sub_format);
            }
        }

        // Truncates extension bytes the layout has no room for, zero-fills the rest.
        out.resize(subchunk2_offset, 0);
        out.extend_from_slice(&self.subchunk2_id);
        out.extend_from_slice(&self.subchunk2_size.to_le_bytes());
        out
    }

    /// Check every header invariant, returning the first one that fails.
    pub fn validate(&self) -> WavResult<()> {
        if self.chunk_id != RIFF_TAG {
            return Err(WavFormatError::invalid_tag("ChunkID", "RIFF", &self.chunk_id));
        }
        if self.format != WAVE_TAG {
            return Err(WavFormatError::invalid_tag("Format", "WAVE", &self.format));
        }
        if self.subchunk1_id != FMT_TAG {
            return Err(WavFormatError::invalid_tag(
                "Subchunk1ID",
                "fmt ",
                &self.subchunk1_id,
            ));
        }
        if !matches!(self.subchunk1_size, 16 | 18 | 40) {
            return Err(WavFormatError::UnsupportedSubchunk1Size(
                self.subchunk1_size,
            ));
        }

        let expected_align = u32::from(self.num_channels) * u32::from(self.bits_per_sample) / 8;
        if u32::from(self.block_align) != expected_align {
            return Err(WavFormatError::BlockAlignMismatch {
                expected: expected_align,
                actual: self.block_align,
            });
        }

        let expected_rate = u64::from(self.sample_rate) * u64::from(self.block_align);
        if u64::from(self.byte_rate) != expected_rate {
            return Err(WavFormatError::ByteRateMismatch {
                expected: expected_rate,
                actual: self.byte_rate,
            });
        }

        if self.bits_per_sample % 8 != 0 {
            return Err(WavFormatError::BitsPerSampleNotByteAligned(
                self.bits_per_sample,
            ));
        }

        let fmt_overhead = self.subchunk1_size.checked_add(20);
        if self.chunk_size.checked_sub(self.subchunk2_size) != fmt_overhead {
            return Err(WavFormatError::ChunkSizeMismatch {
                chunk_size: self.chunk_size,
                subchunk1_size: self.subchunk1_size,
                subchunk2_size: self.subchunk2_size,
            });
        }

        Ok(())
    }

    /// Whether every header invariant holds.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Size of the header in bytes (44, 46 or 68).
    pub fn header_size(&self) -> WavResult<usize> {
        self.validate()?;
        Ok(self.subchunk1_size as usize + 28)
    }

    /// Declared size of the PCM payload in bytes.
    pub fn data_size(&self) -> WavResult<u64> {
        self.validate()?;
        Ok(u64::from(self.subchunk2_size))
    }

    /// Declared size of the whole file in bytes.
    pub fn total_size(&self) -> WavResult<u64> {
        Ok(self.header_size()? as u64 + self.data_size()?)
    }

    /// The encoding of the samples, looking through `WAVE_FORMAT_EXTENSIBLE`.
    pub fn sample_encoding(&self) -> AudioFormat {
        match (self.audio_format, self.extension) {
            (
                AudioFormat::Extensible,
                Some(FmtExtension {
                    extensible: Some(extensible),
                    ..
                }),
            ) => extensible.sub_format_code(),
            (format, _) => format,
        }
    }

    /// Play time of the declared payload.
    pub fn duration(&self) -> Option<Duration> {
        (self.byte_rate > 0).then(|| {
            Duration::from_secs_f64(f64::from(self.subchunk2_size) / f64::from(self.byte_rate))
        })
    }
}

/// Header size implied by `subchunk1_size`, rejecting layouts the decoder cannot read.
fn layout_size(subchunk1_size: u32) -> WavResult<usize> {
    if !(16..=MAX_SUBCHUNK1_SIZE).contains(&subchunk1_size) {
        return Err(WavFormatError::UnsupportedSubchunk1Size(subchunk1_size));
    }
    Ok(subchunk1_size as usize + 28)
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn tag_at(bytes: &[u8], offset: usize) -> [u8; 4] {
    [
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]
}

fn sub_format_guid(format: AudioFormat) -> [u8; 16] {
    let mut guid = [0u8; 16];
    guid[..2].copy_from_slice(&format.code().to_le_bytes());
    guid[2..].copy_from_slice(&KSDATAFORMAT_GUID_TAIL);
    guid
}

fn default_channel_mask(num_channels: u16) -> u32 {
    match num_channels {
        0 => 0,
        n if n >= 32 => u32::MAX,
        n => (1u32 << n) - 1,
    }
}
