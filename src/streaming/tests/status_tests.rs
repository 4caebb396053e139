//! Tests for stream status tracking.

use super::super::buffers::StreamIO;
use super::super::status::*;
use super::init_tracing;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_status_completes_at_total() {
    let status = StreamStatus::fixed(1000, None);
    assert!(status.is_live());
    assert_eq!(status.completed(), Some(false));
    assert_eq!(status.timed_out(), None);

    status.played(999);
    assert!(status.is_live());

    status.played(1);
    assert_eq!(status.completed(), Some(true));
    assert!(!status.is_live());
    assert_eq!(status.state(), StreamState::Completed);
}

#[test]
fn test_status_zero_played_is_ignored() {
    let status = StreamStatus::fixed(10, Some(Duration::from_millis(30)));
    std::thread::sleep(Duration::from_millis(40));
    status.played(0);
    assert_eq!(status.bytes_played(), 0);
    assert_eq!(status.timed_out(), Some(true));
}

#[test]
fn test_status_timeout_resets_on_data() {
    let status = StreamStatus::new(Some(Duration::from_millis(200)), None, BytesTotal::Unknown);
    assert_eq!(status.completed(), None);
    assert!(status.is_live());

    std::thread::sleep(Duration::from_millis(120));
    status.played(4);
    assert_eq!(status.timed_out(), Some(false));

    std::thread::sleep(Duration::from_millis(120));
    assert!(status.is_live());

    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(status.timed_out(), Some(true));
    assert_eq!(status.state(), StreamState::TimedOut);
}

#[test]
fn test_status_stop_overrides() {
    let status = StreamStatus::fixed(10, None);
    status.stop();
    assert!(!status.is_active());
    assert_eq!(status.state(), StreamState::Stopped);

    status.set(true);
    assert!(status.is_live());
}

#[test]
fn test_status_default_timeout_without_total() {
    init_tracing();
    let status = StreamStatus::new(None, None, BytesTotal::Unknown);
    assert_eq!(status.timeout(), Some(DEFAULT_TIMEOUT));
    assert_eq!(status.bytes_total(), None);
    assert_eq!(status.bytes_written(), None);
}

#[test]
fn test_status_follows_live_total() {
    let io = Arc::new(StreamIO::with_initial(&[0u8; 100], None));
    let status = StreamStatus::live(Arc::clone(&io), None);

    // The buffer can declare a total later, so no fallback timeout applies.
    assert_eq!(status.timeout(), None);
    assert_eq!(status.completed(), None);
    assert_eq!(status.bytes_written(), Some(100));
    assert_eq!(status.bytes_buffered(), Some(100));

    io.read(60);
    status.played(60);
    assert_eq!(status.bytes_buffered(), Some(40));

    io.set_bytes_total(Some(60));
    assert_eq!(status.completed(), Some(true));
    assert!(!status.is_live());
}

#[test]
fn test_bytes_total_conversions() {
    assert_eq!(BytesTotal::from(12).get(), Some(12));
    assert!(BytesTotal::from(None).is_unknown());
    assert_eq!(BytesTotal::from(Some(3)).get(), Some(3));
}

#[test]
fn test_buffered_excludes_consumed_header() {
    let io = super::wav_stream(crate::wav::WavSpec::default(), &super::ramp(100));
    let status = StreamStatus::live(Arc::clone(&io), None);
    assert_eq!(status.bytes_buffered(), Some(144));

    super::super::callback::read_header(&io).unwrap();
    assert_eq!(status.bytes_written(), Some(144));
    assert_eq!(status.bytes_buffered(), Some(100));

    io.read(60);
    status.played(60);
    assert_eq!(status.bytes_buffered(), Some(40));
    assert_eq!(status.bytes_written().unwrap() - status.bytes_played(), 84);
}
