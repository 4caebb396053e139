//! Local WAV files.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use super::{CompletionCallback, MIN_CHUNK_SIZE, spawn_feeder};
use crate::error::{RemoteAudioError, RemoteAudioResult};
use crate::streaming::buffers::StreamIO;
use crate::utils::read_full;
use crate::wav::WavHeader;

/// Default number of bytes read from disk per chunk.
pub const DEFAULT_FILE_CHUNK_SIZE: usize = 64 * 1024;

/// Size of the file at `path` in bytes.
pub fn get_file_size<P: AsRef<Path>>(path: P) -> RemoteAudioResult<u64> {
    let path = path.as_ref();
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| RemoteAudioError::file_io(path, e))
}

/// Size of the WAV header at the start of `path`.
pub fn get_wav_header_size<P: AsRef<Path>>(path: P) -> RemoteAudioResult<usize> {
    Ok(WavHeader::from_path(path)?.header_size()?)
}

/// Bytes following the header, whatever the header claims.
pub fn get_wav_data_size<P: AsRef<Path>>(path: P) -> RemoteAudioResult<u64> {
    let path = path.as_ref();
    let header_size = get_wav_header_size(path)? as u64;
    Ok(get_file_size(path)?.saturating_sub(header_size))
}

/// Stream a WAV file into a new [`StreamIO`].
///
/// The first `chunk_size` bytes (at least [`MIN_CHUNK_SIZE`]) are read and
/// their header validated before returning. The buffer's declared total is
/// the payload size: the header's `Subchunk2Size`, capped at what the file
/// actually holds.
pub fn from_file<P: AsRef<Path>>(
    path: P,
    chunk_size: usize,
    on_complete: Option<CompletionCallback>,
) -> RemoteAudioResult<Arc<StreamIO>> {
    let path = path.as_ref();
    let file_size = get_file_size(path)?;
    if file_size == 0 {
        return Err(RemoteAudioError::file_io(
            path,
            io::Error::new(io::ErrorKind::UnexpectedEof, "file is empty"),
        ));
    }

    let chunk_size = chunk_size.max(MIN_CHUNK_SIZE);
    let mut file = File::open(path).map_err(|e| RemoteAudioError::file_io(path, e))?;
    let mut initial = vec![0u8; chunk_size];
    let read = read_full(&mut file, &mut initial).map_err(|e| RemoteAudioError::file_io(path, e))?;
    initial.truncate(read);

    let header = WavHeader::from_bytes(&initial)?;
    header.validate()?;
    let header_size = header.header_size()? as u64;
    let data_total = header.data_size()?.min(file_size.saturating_sub(header_size));

    tracing::debug!(
        path = %path.display(),
        file_size,
        header_size,
        data_total,
        "Streaming WAV file"
    );

    let io = Arc::new(StreamIO::with_initial(&initial, Some(data_total)));
    spawn_feeder(
        "remote-audio-file",
        file,
        Arc::clone(&io),
        chunk_size,
        read as u64,
        move |result| {
            if let (Ok(total), Some(callback)) = (result, on_complete) {
                callback(total);
            }
        },
    )?;

    Ok(io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::{WavFormatError, WavSpec};
    use std::sync::mpsc;
    use std::time::Duration;

    fn write_wav(dir: &Path, name: &str, payload: &[u8]) -> std::path::PathBuf {
        let mut bytes = WavHeader::synthesize(payload.len() as u32, WavSpec::default()).construct();
        bytes.extend_from_slice(payload);
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_size_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav(dir.path(), "tone.wav", &[0u8; 400]);

        assert_eq!(get_file_size(&path).unwrap(), 444);
        assert_eq!(get_wav_header_size(&path).unwrap(), 44);
        assert_eq!(get_wav_data_size(&path).unwrap(), 400);
    }

    #[test]
    fn test_from_file_streams_everything() {
        let dir = tempfile::tempdir().unwrap();
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let path = write_wav(dir.path(), "long.wav", &payload);
        let (tx, rx) = mpsc::channel();

        let io = from_file(
            &path,
            4096,
            Some(Box::new(move |total| {
                let _ = tx.send(total);
            })),
        )
        .unwrap();

        let total = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(total, 200_044);
        assert_eq!(io.bytes_total(), Some(200_000));
        assert_eq!(io.bytes_written(), 200_044);

        let header = crate::streaming::read_header(&io).unwrap();
        assert_eq!(header.num_channels, 2);
        assert_eq!(io.read_all(), payload);
    }

    #[test]
    fn test_from_file_caps_total_at_file_length() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = WavHeader::synthesize(10_000, WavSpec::default()).construct();
        bytes.extend_from_slice(&[0u8; 100]);
        let path = dir.path().join("truncated.wav");
        std::fs::write(&path, bytes).unwrap();

        let io = from_file(&path, DEFAULT_FILE_CHUNK_SIZE, None).unwrap();
        assert_eq!(io.bytes_total(), Some(100));
    }

    #[test]
    fn test_from_file_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = from_file(dir.path().join("missing.wav"), 1024, None).unwrap_err();
        assert!(matches!(err, RemoteAudioError::FileIo { .. }));
    }

    #[test]
    fn test_from_file_rejects_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, vec![b'x'; 128]).unwrap();

        let err = from_file(&path, 1024, None).unwrap_err();
        assert!(err.is_format_error());

        let mut bytes = WavHeader::synthesize(64, WavSpec::default()).construct();
        bytes[..4].copy_from_slice(b"RIFX");
        bytes.extend_from_slice(&[0u8; 64]);
        std::fs::write(&path, bytes).unwrap();

        let err = from_file(&path, 1024, None).unwrap_err();
        assert!(matches!(
            err,
            RemoteAudioError::WavFormat(WavFormatError::InvalidTag { field: "ChunkID", .. })
        ));
    }

    #[test]
    fn test_from_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();

        let err = from_file(&path, 1024, None).unwrap_err();
        assert!(err.is_io_error());
    }
}
