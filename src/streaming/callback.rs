//! Pull side of a WAV stream: turns device requests into buffer reads.

use std::sync::Arc;

use super::buffers::StreamIO;
use super::status::StreamStatus;
use crate::error::{RemoteAudioError, RemoteAudioResult};
use crate::wav::{AudioFormat, WavHeader};

/// Whether the device should keep calling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFlow {
    /// More data is expected.
    Continue,
    /// The stream has finished.
    Complete,
}

/// Consume and validate the WAV header at the front of `io`.
///
/// Producers seed the buffer with at least one full header before handing
/// it out, so a short read here means the source is not a WAV stream.
pub fn read_header(io: &StreamIO) -> RemoteAudioResult<WavHeader> {
    let mut reader = io;
    let header = WavHeader::from_reader(&mut reader)?;
    header.validate()?;
    Ok(header)
}

/// Feeds a device from a [`StreamIO`] holding a WAV byte stream.
///
/// The header must already have been consumed (see [`read_header`]); every
/// byte read afterwards is payload and is reported to the status as played.
/// Reads are kept on frame boundaries, except for the final partial frame of
/// a stream whose total is known.
#[derive(Debug)]
pub struct WavStreamCallback {
    io: Arc<StreamIO>,
    status: Arc<StreamStatus>,
    block_align: usize,
    silence: u8,
}

impl WavStreamCallback {
    /// Create a callback for the stream described by `header`.
    pub fn new(
        io: Arc<StreamIO>,
        status: Arc<StreamStatus>,
        header: &WavHeader,
    ) -> RemoteAudioResult<Self> {
        if header.block_align == 0 {
            return Err(RemoteAudioError::invalid_input("BlockAlign must be non-zero"));
        }

        // 8-bit PCM is unsigned, so its midpoint is 0x80.
        let silence = match (header.sample_encoding(), header.bits_per_sample) {
            (AudioFormat::Pcm, 8) => 0x80,
            _ => 0,
        };

        Ok(Self {
            io,
            status,
            block_align: usize::from(header.block_align),
            silence,
        })
    }

    /// Bytes per frame.
    pub fn block_align(&self) -> usize {
        self.block_align
    }

    /// The byte value written for silence.
    pub fn silence(&self) -> u8 {
        self.silence
    }

    /// The status this callback reports to.
    pub fn status(&self) -> &Arc<StreamStatus> {
        &self.status
    }

    /// Read up to `frame_count` frames.
    ///
    /// A short read is padded with silence to the full request unless the
    /// stream has timed out, in which case only the bytes actually read are
    /// returned.
    pub fn pull(&mut self, frame_count: usize) -> (Vec<u8>, CallbackFlow) {
        let mut out = vec![self.silence; frame_count * self.block_align];
        let read = self.read_payload(&mut out);

        if read < out.len() && self.status.timed_out() == Some(true) {
            out.truncate(read);
        }
        (out, self.flow())
    }

    /// Fill `out` completely, padding whatever could not be read with silence.
    ///
    /// Used from real-time callbacks where the device buffer must always be
    /// written in full.
    pub fn fill(&mut self, out: &mut [u8]) -> CallbackFlow {
        let read = self.read_payload(out);
        out[read..].fill(self.silence);
        self.flow()
    }

    fn read_payload(&mut self, out: &mut [u8]) -> usize {
        let available = self.io.available();
        let mut ready = available - available % self.block_align;

        if let Some(rest) = self.remaining() {
            if rest <= available as u64 {
                ready = rest as usize;
            }
        }

        let wanted = out.len() - out.len() % self.block_align;
        let read = self.io.read_into(&mut out[..ready.min(wanted)]);
        self.status.played(read);
        read
    }

    fn remaining(&self) -> Option<u64> {
        self.status
            .bytes_total()
            .map(|total| total.saturating_sub(self.status.bytes_played()))
    }

    fn flow(&self) -> CallbackFlow {
        if self.status.is_live() {
            CallbackFlow::Continue
        } else {
            CallbackFlow::Complete
        }
    }
}
