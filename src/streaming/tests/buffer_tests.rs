//! Tests for the shared stream buffer.

use super::super::buffers::*;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_stream_io_basic_operations() {
    let io = StreamIO::new();
    assert!(io.is_empty());
    assert_eq!(io.read(10), Vec::<u8>::new());

    assert_eq!(io.write(b"Hello"), 5);
    assert_eq!(io.write(b"World"), 5);
    assert_eq!(io.bytes_written(), 10);
    assert_eq!(io.available(), 10);

    assert_eq!(io.read(5), b"Hello");
    assert_eq!(io.read(100), b"World");
    assert!(io.is_empty());
    assert_eq!(io.position(), 10);
    assert_eq!(io.bytes_written(), 10);
}

#[test]
fn test_stream_io_interleaved_reads_and_writes() {
    let io = StreamIO::with_initial(b"abc", Some(9));
    assert_eq!(io.bytes_written(), 3);
    assert_eq!(io.bytes_total(), Some(9));

    assert_eq!(io.read(2), b"ab");
    io.write(b"def");
    assert_eq!(io.read(2), b"cd");
    io.write(b"ghi");
    assert_eq!(io.read_all(), b"efghi");
    assert_eq!(io.bytes_written(), 9);
}

#[test]
fn test_stream_io_read_into() {
    let io = StreamIO::with_initial(&[1, 2, 3], None);
    let mut buf = [0u8; 8];
    assert_eq!(io.read_into(&mut buf), 3);
    assert_eq!(&buf[..3], &[1, 2, 3]);
    assert_eq!(io.read_into(&mut buf), 0);
}

#[test]
fn test_stream_io_compaction_keeps_counts() {
    let io = StreamIO::new();
    let block: Vec<u8> = (0..=255u8).collect();

    let mut expected = 0u8;
    for _ in 0..1024 {
        io.write(&block);
        for byte in io.read(200) {
            assert_eq!(byte, expected);
            expected = expected.wrapping_add(1);
        }
    }

    assert_eq!(io.bytes_written(), 1024 * 256);
    assert_eq!(io.position(), 1024 * 200);
    assert_eq!(io.available(), 1024 * 56);
}

#[test]
fn test_stream_io_concurrent_producer_preserves_order() {
    let io = Arc::new(StreamIO::new());
    let producer = {
        let io = Arc::clone(&io);
        std::thread::spawn(move || {
            for i in 0..10_000u32 {
                io.write(&i.to_le_bytes());
            }
        })
    };

    let mut received = Vec::with_capacity(40_000);
    let deadline = Instant::now() + Duration::from_secs(10);
    while received.len() < 40_000 && Instant::now() < deadline {
        received.extend(io.read(1000));
    }
    producer.join().unwrap();

    assert_eq!(received.len(), 40_000);
    for (i, chunk) in received.chunks_exact(4).enumerate() {
        let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        assert_eq!(value, i as u32);
    }
}

#[test]
fn test_stream_io_std_io_traits() {
    let io = StreamIO::new();
    let mut writer = &io;
    writer.write_all(b"stream").unwrap();
    writer.flush().unwrap();

    let mut reader = &io;
    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "stream");
}

#[test]
fn test_await_data_reaches_target() {
    let io = Arc::new(StreamIO::new());
    let producer = {
        let io = Arc::clone(&io);
        std::thread::spawn(move || {
            for _ in 0..4 {
                std::thread::sleep(Duration::from_millis(10));
                io.write(&[0u8; 300]);
            }
        })
    };

    let config = AwaitConfig {
        size: 1024,
        timeout: Duration::from_secs(5),
        interval: Duration::from_millis(5),
    };
    let mut ticks = 0;
    assert!(io.await_data(&config, |_, _| ticks += 1));
    assert!(ticks > 0);
    assert!(io.bytes_written() >= 1024);
    producer.join().unwrap();
}

#[test]
fn test_await_data_times_out() {
    let io = StreamIO::with_initial(&[0u8; 10], None);
    let config = AwaitConfig {
        size: 1024,
        timeout: Duration::from_millis(50),
        interval: Duration::from_millis(10),
    };

    let mut last_seen = None;
    assert!(!io.await_data(&config, |_, written| last_seen = Some(written)));
    assert_eq!(last_seen, Some(10));
}

#[test]
fn test_await_config_defaults() {
    let config = AwaitConfig::default();
    assert_eq!(config.size, 1024);
    assert_eq!(config.timeout, Duration::from_secs(3));
    assert_eq!(config.interval, Duration::from_millis(200));
    assert_eq!(AwaitConfig::bytes(4096).size, 4096);
}
