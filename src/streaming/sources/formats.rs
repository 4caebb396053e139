//! Container formats the transcoder understands, and how each is streamed.

use serde::Serialize;

use crate::error::{RemoteAudioError, RemoteAudioResult};

/// One entry of the transcoder's format table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerFormat {
    /// Short name as passed to `-f`; aliases are comma separated
    pub name: &'static str,
    /// Human readable description
    pub description: &'static str,
    /// Can be read (demuxed)
    pub demux: bool,
    /// Can be written (muxed)
    pub mux: bool,
}

impl ContainerFormat {
    const fn new(name: &'static str, description: &'static str, demux: bool, mux: bool) -> Self {
        Self {
            name,
            description,
            demux,
            mux,
        }
    }

    /// Every alias this entry answers to.
    pub fn aliases(&self) -> impl Iterator<Item = &'static str> {
        self.name.split(',')
    }

    /// Whether `name` is one of this entry's aliases (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        self.aliases().any(|alias| alias.eq_ignore_ascii_case(name))
    }

    /// The first alias, used on the transcoder command line.
    pub fn primary_name(&self) -> &'static str {
        self.aliases().next().unwrap_or(self.name)
    }
}

/// Audio containers and raw codecs known to the transcoder.
pub const CONTAINER_FORMATS: &[ContainerFormat] = &[
    ContainerFormat::new("aac", "raw ADTS AAC (Advanced Audio Coding)", true, false),
    ContainerFormat::new("ac3", "raw AC-3", true, true),
    ContainerFormat::new("aiff", "Audio IFF", true, true),
    ContainerFormat::new("alaw", "PCM A-law", true, true),
    ContainerFormat::new("amr", "3GPP AMR", true, true),
    ContainerFormat::new("ape", "Monkey's Audio", true, false),
    ContainerFormat::new("asf", "ASF (Advanced / Active Streaming Format)", true, true),
    ContainerFormat::new("au", "Sun AU", true, true),
    ContainerFormat::new("caf", "Apple CAF (Core Audio Format)", true, true),
    ContainerFormat::new("dts", "raw DTS", true, true),
    ContainerFormat::new("eac3", "raw E-AC-3", true, true),
    ContainerFormat::new("f32le", "PCM 32-bit floating-point little-endian", true, true),
    ContainerFormat::new("flac", "raw FLAC", true, true),
    ContainerFormat::new("matroska,webm,mka", "Matroska / WebM", true, false),
    ContainerFormat::new("mov,mp4,m4a,3gp,3g2,mj2", "QuickTime / MOV", true, false),
    ContainerFormat::new("mp2", "MP2 (MPEG audio layer 2)", false, true),
    ContainerFormat::new("mp3", "MP3 (MPEG audio layer 3)", true, true),
    ContainerFormat::new("mulaw", "PCM mu-law", true, true),
    ContainerFormat::new("oga", "Ogg Audio", false, true),
    ContainerFormat::new("ogg", "Ogg", true, true),
    ContainerFormat::new("opus", "Ogg Opus", false, true),
    ContainerFormat::new("s16le", "PCM signed 16-bit little-endian", true, true),
    ContainerFormat::new("s24le", "PCM signed 24-bit little-endian", true, true),
    ContainerFormat::new("spx", "Ogg Speex", false, true),
    ContainerFormat::new("tta", "TTA (True Audio)", true, true),
    ContainerFormat::new("u8", "PCM unsigned 8-bit", true, true),
    ContainerFormat::new("voc", "Creative Voice", true, true),
    ContainerFormat::new("w64", "Sony Wave64", true, true),
    ContainerFormat::new("wav,wave", "WAV / WAVE (Waveform Audio)", true, true),
    ContainerFormat::new("wv", "raw WavPack", true, true),
];

/// Look up a format by any of its aliases.
pub fn lookup(name: &str) -> Option<&'static ContainerFormat> {
    CONTAINER_FORMATS.iter().find(|format| format.matches(name))
}

/// How a source of a given format gets into a [`StreamIO`](crate::streaming::StreamIO).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Already WAV: bytes are fed through unchanged.
    Wav,
    /// Decoded to PCM by the external transcoder.
    Transcoded(&'static ContainerFormat),
}

impl SourceFormat {
    /// Decide how to stream a source in the format `name`.
    ///
    /// Fails for names the transcoder does not know or cannot read.
    pub fn resolve(name: &str) -> RemoteAudioResult<Self> {
        let name = name.trim().trim_start_matches('.');
        if name.eq_ignore_ascii_case("wav") || name.eq_ignore_ascii_case("wave") {
            return Ok(Self::Wav);
        }

        match lookup(name) {
            Some(format) if format.demux => Ok(Self::Transcoded(format)),
            Some(_) => Err(RemoteAudioError::invalid_input(format!(
                "format '{name}' can be written but not read"
            ))),
            None => Err(RemoteAudioError::invalid_input(format!(
                "unsupported format '{name}'"
            ))),
        }
    }

    /// Resolve from the extension of a path or URL.
    ///
    /// Query strings and fragments are ignored.
    pub fn from_location(location: &str) -> RemoteAudioResult<Self> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or(location);
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);

        match file_name.rsplit_once('.') {
            Some((_, extension)) if !extension.is_empty() => Self::resolve(extension),
            _ => Err(RemoteAudioError::invalid_input(format!(
                "cannot infer a format from '{location}'"
            ))),
        }
    }

    /// Whether the source needs the external transcoder.
    pub fn needs_transcoder(&self) -> bool {
        matches!(self, Self::Transcoded(_))
    }
}
