//! Tests for the stream lifecycle.

use super::super::status::{BytesTotal, StreamState, StreamStatus};
use super::super::stream::AudioStream;
use super::super::traits::PlaybackHandle;
use super::init_tracing;
use crate::error::{RemoteAudioError, RemoteAudioResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct MockHandle {
    events: Arc<Mutex<Vec<&'static str>>>,
    fail_start: bool,
    fail_stop: bool,
}

impl PlaybackHandle for MockHandle {
    fn start(&mut self) -> RemoteAudioResult<()> {
        if self.fail_start {
            return Err(RemoteAudioError::backend("mock", "no device"));
        }
        self.events.lock().push("start");
        Ok(())
    }

    fn stop(&mut self) -> RemoteAudioResult<()> {
        self.events.lock().push("stop");
        if self.fail_stop {
            return Err(RemoteAudioError::Device("already closed".to_string()));
        }
        Ok(())
    }

    fn close(&mut self) -> RemoteAudioResult<()> {
        self.events.lock().push("close");
        Ok(())
    }
}

fn mock_stream(status: StreamStatus) -> (AudioStream<MockHandle>, Arc<Mutex<Vec<&'static str>>>) {
    let handle = MockHandle::default();
    let events = Arc::clone(&handle.events);
    let stream = AudioStream::new(handle, Arc::new(status)).with_poll_interval(Duration::from_millis(5));
    (stream, events)
}

#[test]
fn test_stop_is_idempotent() {
    let (mut stream, events) = mock_stream(StreamStatus::fixed(100, None));
    stream.start().unwrap();
    stream.start().unwrap();
    assert!(stream.is_started());
    assert!(stream.is_live());

    stream.stop();
    stream.stop();
    assert!(!stream.is_live());
    assert!(!stream.status().is_active());
    assert_eq!(*events.lock(), ["start", "stop", "close"]);

    drop(stream);
    assert_eq!(events.lock().len(), 3);
}

#[test]
fn test_stop_swallows_device_errors() {
    init_tracing();
    let handle = MockHandle {
        fail_stop: true,
        ..MockHandle::default()
    };
    let events = Arc::clone(&handle.events);
    let mut stream = AudioStream::new(handle, Arc::new(StreamStatus::fixed(1, None)));

    stream.start().unwrap();
    stream.stop();
    assert_eq!(*events.lock(), ["start", "stop", "close"]);
}

#[test]
fn test_restart_after_stop_fails() {
    let (mut stream, _events) = mock_stream(StreamStatus::fixed(1, None));
    stream.start().unwrap();
    stream.stop();

    let err = stream.start().unwrap_err();
    assert!(matches!(err, RemoteAudioError::InvalidInputParameters(_)));
}

#[test]
fn test_finish_waits_for_completion() {
    let (mut stream, events) = mock_stream(StreamStatus::fixed(100, None));
    stream.start().unwrap();

    let status = Arc::clone(stream.status());
    let player = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(60));
        status.played(100);
    });

    let started = Instant::now();
    assert_eq!(stream.finish(), StreamState::Completed);
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(*events.lock(), ["start", "stop", "close"]);
    player.join().unwrap();
}

#[test]
fn test_exit_interrupt_skips_wait() {
    let (stream, events) = mock_stream(StreamStatus::fixed(100, None));
    let mut stream = stream.with_exit_interrupt(true);
    assert!(stream.exit_interrupt());
    stream.start().unwrap();

    assert_eq!(stream.finish(), StreamState::Live);
    assert_eq!(*events.lock(), ["start", "stop", "close"]);
}

#[test]
fn test_run_waits_for_timeout() {
    init_tracing();
    let status = StreamStatus::new(Some(Duration::from_millis(50)), None, BytesTotal::Unknown);
    let (stream, events) = mock_stream(status);

    let started = Instant::now();
    let value = stream
        .run(|stream| {
            assert!(stream.is_live());
            Ok::<_, RemoteAudioError>(7)
        })
        .unwrap();

    assert_eq!(value, 7);
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(*events.lock(), ["start", "stop", "close"]);
}

#[test]
fn test_run_error_skips_wait() {
    let (stream, events) = mock_stream(StreamStatus::fixed(100, None));

    let err = stream
        .run(|_| Err::<(), _>(RemoteAudioError::invalid_input("caller failed")))
        .unwrap_err();

    assert!(matches!(err, RemoteAudioError::InvalidInputParameters(_)));
    assert_eq!(*events.lock(), ["start", "stop", "close"]);
}

#[test]
fn test_run_reports_start_failure() {
    let handle = MockHandle {
        fail_start: true,
        ..MockHandle::default()
    };
    let events = Arc::clone(&handle.events);
    let stream = AudioStream::new(handle, Arc::new(StreamStatus::fixed(1, None)));

    let err = stream.run(|_| Ok::<_, RemoteAudioError>(())).unwrap_err();
    assert!(err.is_device_error());
    assert_eq!(*events.lock(), ["close"]);
}

#[test]
fn test_drop_unstarted_stream_releases_without_waiting() {
    let (stream, events) = mock_stream(StreamStatus::fixed(100, None));
    let status = Arc::clone(stream.status());

    drop(stream);
    assert_eq!(*events.lock(), ["close"]);
    assert!(!status.is_active());
}

#[test]
fn test_drop_started_stream_drains() {
    let (mut stream, events) = mock_stream(StreamStatus::fixed(10, None));
    stream.start().unwrap();
    stream.status().played(10);

    drop(stream);
    assert_eq!(*events.lock(), ["start", "stop", "close"]);
}

#[test]
fn test_drop_while_panicking_skips_wait() {
    // Nothing is ever played and there is no timeout, so a drain would never end.
    let (mut stream, events) = mock_stream(StreamStatus::fixed(100, None));
    stream.start().unwrap();
    let status = Arc::clone(stream.status());

    let started = Instant::now();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        let _stream = stream;
        panic!("playback body failed");
    }));

    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(*events.lock(), ["start", "stop", "close"]);
    assert_eq!(status.state(), StreamState::Stopped);
}
