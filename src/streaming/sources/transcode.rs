//! Non-WAV sources decoded by an external `ffmpeg` process.
//!
//! The transcoder is asked for raw signed 16-bit PCM on stdout. Since raw
//! PCM has no header, a WAV header with the largest representable data size
//! is synthesized and placed in the buffer first; the real payload size is
//! declared once the process exits.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::PathBuf;
use std::process::{ChildStdin, Command, Stdio};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::formats::ContainerFormat;
use super::{CompletionCallback, spawn_feeder};
use crate::error::{RemoteAudioError, RemoteAudioResult};
use crate::streaming::buffers::StreamIO;
use crate::wav::{WavHeader, WavSpec};

/// Program name looked up on `PATH` when none is configured.
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";

/// Bytes read from the transcoder's stdout per chunk.
pub const TRANSCODE_CHUNK_SIZE: usize = 64 * 1024;

/// Where the transcoder reads its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeInput {
    /// A local file.
    File(PathBuf),
    /// Anything the transcoder can open itself, typically an HTTP URL.
    Url(String),
    /// Bytes written through [`TranscodedStream::write_input`].
    Pipe,
}

impl TranscodeInput {
    fn to_arg(&self) -> OsString {
        match self {
            Self::File(path) => path.clone().into_os_string(),
            Self::Url(url) => OsString::from(url),
            Self::Pipe => OsString::from("pipe:0"),
        }
    }
}

/// Command line for one transcoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeCommand {
    program: OsString,
    input: TranscodeInput,
    input_format: Option<String>,
    stream_loop: Option<i32>,
    output: WavSpec,
}

impl TranscodeCommand {
    /// Decode `input` to 16-bit stereo at 44.1 kHz.
    pub fn new(input: TranscodeInput) -> Self {
        Self {
            program: OsString::from(DEFAULT_TRANSCODER),
            input,
            input_format: None,
            stream_loop: None,
            output: WavSpec::s16le(2, 44_100),
        }
    }

    /// Decode a local file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(TranscodeInput::File(path.into()))
    }

    /// Decode a URL fetched by the transcoder.
    pub fn url(url: impl Into<String>) -> Self {
        Self::new(TranscodeInput::Url(url.into()))
    }

    /// Decode bytes written by the caller.
    pub fn pipe() -> Self {
        Self::new(TranscodeInput::Pipe)
    }

    /// Force the input container instead of letting the transcoder probe it.
    pub fn with_input_format(mut self, format: &ContainerFormat) -> Self {
        self.input_format = Some(format.primary_name().to_string());
        self
    }

    /// Output channel count and sample rate.
    pub fn with_output(mut self, num_channels: u16, sample_rate: u32) -> Self {
        self.output = WavSpec::s16le(num_channels, sample_rate);
        self
    }

    /// Loop the input `count` extra times; `-1` loops forever.
    pub fn with_stream_loop(mut self, count: i32) -> Self {
        self.stream_loop = Some(count);
        self
    }

    /// Use a different transcoder binary.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// The binary that will be run.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Input source.
    pub fn input(&self) -> &TranscodeInput {
        &self.input
    }

    /// Format of the PCM the transcoder produces.
    pub fn output_spec(&self) -> WavSpec {
        self.output
    }

    /// Arguments passed to the program, in order.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error"]
            .into_iter()
            .map(OsString::from)
            .collect();

        if let Some(count) = self.stream_loop {
            args.push("-stream_loop".into());
            args.push(count.to_string().into());
        }
        if let Some(format) = &self.input_format {
            args.push("-f".into());
            args.push(format.into());
        }
        args.push("-i".into());
        args.push(self.input.to_arg());

        args.push("-f".into());
        args.push("s16le".into());
        args.push("-ac".into());
        args.push(self.output.num_channels.to_string().into());
        args.push("-ar".into());
        args.push(self.output.sample_rate.to_string().into());
        args.push("pipe:1".into());
        args
    }

    /// A ready to spawn process with stdout captured.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.args())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(match self.input {
                TranscodeInput::Pipe => Stdio::piped(),
                _ => Stdio::null(),
            });
        command
    }
}

/// Whether `program` can be launched. Checked once per program and cached.
pub fn transcoder_available(program: &OsStr) -> bool {
    static CHECKED: OnceLock<Mutex<HashMap<OsString, bool>>> = OnceLock::new();

    let mut checked = CHECKED.get_or_init(|| Mutex::new(HashMap::new())).lock();
    *checked.entry(program.to_os_string()).or_insert_with(|| {
        let found = Command::new(program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        if !found {
            tracing::warn!(program = %program.to_string_lossy(), "Transcoder not found");
        }
        found
    })
}

/// The output side of a running transcoder.
#[derive(Debug)]
pub struct TranscodedStream {
    io: Arc<StreamIO>,
    stdin: Option<ChildStdin>,
    spec: WavSpec,
}

impl TranscodedStream {
    /// The buffer the transcoder writes WAV bytes into.
    pub fn io(&self) -> &Arc<StreamIO> {
        &self.io
    }

    /// Format of the decoded PCM.
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Send input bytes to a [`TranscodeInput::Pipe`] transcoder.
    pub fn write_input(&mut self, bytes: &[u8]) -> RemoteAudioResult<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            RemoteAudioError::invalid_input("transcoder input is not a pipe or was already closed")
        })?;
        stdin.write_all(bytes)?;
        Ok(())
    }

    /// Close the input pipe so the transcoder can finish.
    pub fn finish_input(&mut self) {
        self.stdin = None;
    }

    /// Whether input can still be written.
    pub fn accepts_input(&self) -> bool {
        self.stdin.is_some()
    }

    /// Give up the input pipe (if any) and keep only the buffer.
    pub fn into_io(self) -> Arc<StreamIO> {
        self.io
    }
}

/// Start the transcoder and stream its output into a new [`StreamIO`].
///
/// The buffer starts with a synthesized header for the command's output
/// format. Once the process exits, the buffer's total is set to the number
/// of PCM bytes produced and `on_complete` receives the same number.
pub fn from_transcoder(
    command: TranscodeCommand,
    on_complete: Option<CompletionCallback>,
) -> RemoteAudioResult<TranscodedStream> {
    let spec = command.output_spec();
    if matches!(spec.block_align(), None | Some(0)) {
        return Err(RemoteAudioError::invalid_input(format!(
            "cannot describe {} channel output in a WAV header",
            spec.num_channels
        )));
    }
    if !transcoder_available(command.program()) {
        return Err(RemoteAudioError::Transcoder(format!(
            "'{}' is not installed or not on PATH",
            command.program().to_string_lossy()
        )));
    }

    let mut child = command.to_command().spawn().map_err(|e| {
        RemoteAudioError::Transcoder(format!(
            "failed to start '{}': {e}",
            command.program().to_string_lossy()
        ))
    })?;
    let stdin = child.stdin.take();
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RemoteAudioError::Transcoder("stdout was not captured".to_string()))?;

    let header = WavHeader::synthesize_unbounded(spec).construct();
    let io = Arc::new(StreamIO::with_initial(&header, None));
    let declared = Arc::downgrade(&io);

    tracing::debug!(
        args = ?command.args(),
        channels = spec.num_channels,
        sample_rate = spec.sample_rate,
        "Started transcoder"
    );

    spawn_feeder(
        "remote-audio-transcoder",
        stdout,
        Arc::clone(&io),
        TRANSCODE_CHUNK_SIZE,
        0,
        move |result| match result {
            Ok(pcm_bytes) => {
                match child.wait() {
                    Ok(status) if !status.success() => {
                        tracing::warn!(%status, "Transcoder exited with failure")
                    }
                    Err(err) => tracing::warn!(error = %err, "Failed to reap transcoder"),
                    Ok(_) => {}
                }
                if let Some(io) = declared.upgrade() {
                    io.set_bytes_total(Some(pcm_bytes));
                }
                if let Some(callback) = on_complete {
                    callback(pcm_bytes);
                }
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
            }
        },
    )?;

    Ok(TranscodedStream { io, stdin, spec })
}
