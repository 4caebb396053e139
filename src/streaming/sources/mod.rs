//! Producers that fill a [`StreamIO`] from a file, an HTTP response or an
//! external transcoder.
//!
//! Every producer reads an initial chunk synchronously so construction
//! errors (missing file, bad status, invalid header) are returned to the
//! caller, then hands the rest of the transfer to a background thread and
//! returns the shared buffer straight away. Errors on that thread are
//! logged and end the transfer; the consumer notices through its
//! inactivity timeout.

pub mod file;
pub mod formats;
#[cfg(feature = "http")]
pub mod http;
pub mod transcode;

pub use file::{
    DEFAULT_FILE_CHUNK_SIZE, from_file, get_file_size, get_wav_data_size, get_wav_header_size,
};
pub use formats::{ContainerFormat, SourceFormat};
#[cfg(feature = "http")]
pub use http::{HttpConfig, from_http, get_http_size};
pub use transcode::{
    TranscodeCommand, TranscodeInput, TranscodedStream, from_transcoder, transcoder_available,
};

use std::io::{self, Read};
use std::sync::Arc;

use super::buffers::StreamIO;
use crate::error::RemoteAudioResult;
use crate::wav::WAV_EXTENSIBLE_HEADER_SIZE;

/// Smallest chunk a producer will read, so the first read always holds a
/// complete header.
pub const MIN_CHUNK_SIZE: usize = WAV_EXTENSIBLE_HEADER_SIZE;

/// Invoked on the producer thread once the source is exhausted, with the
/// number of bytes it delivered. Not invoked when the transfer fails.
pub type CompletionCallback = Box<dyn FnOnce(u64) + Send + 'static>;

/// Copy `reader` into `io` on a named background thread.
///
/// `delivered` is the number of bytes already written before the thread
/// starts. `on_finish` receives the final count, or the error that ended
/// the transfer.
pub(crate) fn spawn_feeder<R, F>(
    name: &str,
    mut reader: R,
    io: Arc<StreamIO>,
    chunk_size: usize,
    delivered: u64,
    on_finish: F,
) -> RemoteAudioResult<()>
where
    R: Read + Send + 'static,
    F: FnOnce(io::Result<u64>) + Send + 'static,
{
    let source = name.to_string();
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let result = pump(&mut reader, &io, chunk_size, delivered);
            match &result {
                Ok(total) => tracing::debug!(%source, total, "Source exhausted"),
                Err(err) => tracing::warn!(%source, error = %err, "Source transfer stopped"),
            }
            on_finish(result);
        })?;
    Ok(())
}

/// Move everything from `reader` into `io`, `chunk_size` bytes at a time.
///
/// Stops early with `BrokenPipe` once the producer holds the only reference
/// to `io`, since nobody is left to read it.
pub(crate) fn pump<R: Read + ?Sized>(
    reader: &mut R,
    io: &Arc<StreamIO>,
    chunk_size: usize,
    mut delivered: u64,
) -> io::Result<u64> {
    let mut chunk = vec![0u8; chunk_size.max(1)];
    loop {
        if Arc::strong_count(io) == 1 {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stream buffer was dropped by its consumer",
            ));
        }

        let read = match reader.read(&mut chunk) {
            Ok(0) => return Ok(delivered),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        io.write(&chunk[..read]);
        delivered += read as u64;
        tracing::trace!(read, delivered, "Wrote chunk to stream buffer");
    }
}
