//! Playing WAV streams on a CPAL output device.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, SupportedBufferSize};
use serde::{Deserialize, Serialize};

use super::devices::{DeviceManager, DeviceSelector};
use super::sample::SampleDecoder;
use crate::error::{RemoteAudioError, RemoteAudioResult};
use crate::streaming::sources::{
    DEFAULT_FILE_CHUNK_SIZE, SourceFormat, TranscodeCommand, from_file, from_transcoder,
};
use crate::streaming::{
    AudioStream, AwaitConfig, BytesTotal, DEFAULT_TIMEOUT, PlaybackHandle, StreamIO, StreamStatus,
    WavStreamCallback, read_header,
};

/// Frames requested from the device per callback when it lets us choose.
pub const DEFAULT_CHUNK_SIZE: u32 = 1024;

/// How a stream is opened on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Preferred frames per device callback, clamped to what the device supports
    pub chunk_size: u32,
    /// Stop after this long without new data
    pub timeout: Option<Duration>,
    /// Stop immediately on release instead of waiting for playback to drain
    pub exit_interrupt: bool,
    /// Start the device as soon as the stream is opened
    pub start: bool,
    /// Output device to use
    pub device: DeviceSelector,
    /// Wait for this much data before opening the device
    pub prebuffer: Option<AwaitConfig>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Some(DEFAULT_TIMEOUT),
            exit_interrupt: false,
            start: true,
            device: DeviceSelector::Default,
            prebuffer: None,
        }
    }
}

/// [`PlaybackHandle`] over a CPAL output stream.
pub struct CpalHandle {
    stream: Option<cpal::Stream>,
}

impl CpalHandle {
    /// Wrap a built stream.
    pub fn new(stream: cpal::Stream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    fn stream(&self) -> RemoteAudioResult<&cpal::Stream> {
        self.stream
            .as_ref()
            .ok_or_else(|| RemoteAudioError::Device("output stream is already closed".to_string()))
    }
}

impl PlaybackHandle for CpalHandle {
    fn start(&mut self) -> RemoteAudioResult<()> {
        self.stream()?.play()?;
        Ok(())
    }

    fn stop(&mut self) -> RemoteAudioResult<()> {
        self.stream()?.pause()?;
        Ok(())
    }

    fn close(&mut self) -> RemoteAudioResult<()> {
        self.stream = None;
        Ok(())
    }
}

fn buffer_size(supported: &SupportedBufferSize, preferred: u32) -> BufferSize {
    match supported {
        SupportedBufferSize::Range { min, max } => BufferSize::Fixed(preferred.max(*min).min(*max)),
        SupportedBufferSize::Unknown => BufferSize::Default,
    }
}

/// Open a device stream that plays the WAV byte stream in `io`.
///
/// The header is consumed from the front of `io` and decides the channel
/// count, rate and sample format the device is opened with. With
/// [`BytesTotal::Unknown`] the stream follows the total declared by `io`'s
/// producer.
pub fn open_wav_stream(
    manager: &DeviceManager,
    io: Arc<StreamIO>,
    bytes_total: BytesTotal,
    config: &PlaybackConfig,
) -> RemoteAudioResult<AudioStream<CpalHandle>> {
    let header = read_header(&io)?;
    let decoder = SampleDecoder::for_header(&header)?;

    if let Some(prebuffer) = &config.prebuffer {
        let ready = io.await_data(prebuffer, |_, written| {
            tracing::trace!(written, target = prebuffer.size, "Prebuffering");
        });
        if !ready {
            tracing::warn!(
                written = io.bytes_written(),
                "Starting playback before the prebuffer target was reached"
            );
        }
    }

    let status = Arc::new(StreamStatus::new(
        config.timeout,
        Some(Arc::clone(&io)),
        bytes_total,
    ));
    let mut callback = WavStreamCallback::new(Arc::clone(&io), Arc::clone(&status), &header)?;

    let device = manager.find(&config.device)?;
    let buffer_size = device
        .default_output_config()
        .map(|supported| buffer_size(supported.buffer_size(), config.chunk_size))
        .unwrap_or(BufferSize::Default);
    let stream_config = cpal::StreamConfig {
        channels: header.num_channels,
        sample_rate: cpal::SampleRate(header.sample_rate),
        buffer_size,
    };

    tracing::info!(
        channels = header.num_channels,
        sample_rate = header.sample_rate,
        bits_per_sample = header.bits_per_sample,
        encoding = %header.sample_encoding(),
        ?buffer_size,
        "Opening output stream"
    );

    let channels = usize::from(header.num_channels);
    let block_align = callback.block_align();
    let mut scratch = vec![0u8; config.chunk_size as usize * block_align];
    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len() / channels * block_align, 0);
            callback.fill(&mut scratch);
            let decoded = decoder.decode(&scratch, data);
            data[decoded..].fill(0.0);
        },
        |err| tracing::warn!(error = %err, "Output stream error"),
        None,
    )?;

    let mut stream = AudioStream::new(CpalHandle::new(stream), status)
        .with_exit_interrupt(config.exit_interrupt);
    if config.start {
        stream.start()?;
    }
    Ok(stream)
}

/// Play a local file.
///
/// `format` overrides the format implied by the file extension. WAV files
/// are streamed directly; anything else goes through the transcoder.
pub fn play_file<P: AsRef<Path>>(
    manager: &DeviceManager,
    path: P,
    format: Option<&str>,
    config: &PlaybackConfig,
) -> RemoteAudioResult<AudioStream<CpalHandle>> {
    let path = path.as_ref();
    let source_format = match format {
        Some(format) => SourceFormat::resolve(format)?,
        None => SourceFormat::from_location(&path.to_string_lossy())?,
    };

    let io = match source_format {
        SourceFormat::Wav => from_file(path, DEFAULT_FILE_CHUNK_SIZE, None)?,
        SourceFormat::Transcoded(container) => {
            if !path.is_file() {
                return Err(RemoteAudioError::file_io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                ));
            }
            from_transcoder(TranscodeCommand::file(path).with_input_format(container), None)?
                .into_io()
        }
    };
    open_wav_stream(manager, io, BytesTotal::Unknown, config)
}

/// Play a remote resource.
///
/// `format` overrides the format implied by the URL path. WAV resources are
/// downloaded directly; anything else is fetched by the transcoder.
#[cfg(feature = "http")]
pub fn play_http(
    manager: &DeviceManager,
    url: &str,
    format: Option<&str>,
    http: &crate::streaming::sources::HttpConfig,
    config: &PlaybackConfig,
) -> RemoteAudioResult<AudioStream<CpalHandle>> {
    let source_format = match format {
        Some(format) => SourceFormat::resolve(format)?,
        None => SourceFormat::from_location(url)?,
    };

    let io = match source_format {
        SourceFormat::Wav => crate::streaming::sources::from_http(url, http, None)?,
        SourceFormat::Transcoded(container) => {
            from_transcoder(TranscodeCommand::url(url).with_input_format(container), None)?
                .into_io()
        }
    };
    open_wav_stream(manager, io, BytesTotal::Unknown, config)
}
