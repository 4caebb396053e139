//! Tests for streaming functionality.
//!
//! Covers the shared buffer, stream status, the frame callback and the
//! stream lifecycle. Nothing here needs an audio device.

use std::sync::Arc;

use crate::streaming::StreamIO;
use crate::wav::{WavHeader, WavSpec};

mod buffer_tests;
mod status_tests;
mod stream_tests;

/// A buffer holding a complete WAV stream for `spec` with `payload` as data.
pub(crate) fn wav_stream(spec: WavSpec, payload: &[u8]) -> Arc<StreamIO> {
    let mut bytes = WavHeader::synthesize(payload.len() as u32, spec).construct();
    bytes.extend_from_slice(payload);
    Arc::new(StreamIO::with_initial(&bytes, Some(payload.len() as u64)))
}

/// Route `tracing` output to the test harness; set `RUST_LOG` to see it.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic non-silent payload of `len` bytes.
pub(crate) fn ramp(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 200) as u8 + 1).collect()
}
