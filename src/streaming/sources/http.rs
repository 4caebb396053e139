//! WAV streams downloaded over HTTP(S).

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_LENGTH;
use serde::{Deserialize, Serialize};

use super::{CompletionCallback, MIN_CHUNK_SIZE, spawn_feeder};
use crate::error::{RemoteAudioError, RemoteAudioResult};
use crate::streaming::buffers::StreamIO;
use crate::utils::read_full;
use crate::wav::WavHeader;

/// Request settings for HTTP sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Limit on connecting and on each read of the response
    pub timeout: Duration,
    /// Bytes read from the response per chunk
    pub chunk_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            chunk_size: 1024 * 1024,
        }
    }
}

impl HttpConfig {
    /// Client for a single request.
    ///
    /// The blocking client applies its timeout to every read of the body
    /// rather than to the whole transfer, so a long stream keeps playing
    /// while a stalled server ends the feeder.
    fn client(&self) -> RemoteAudioResult<Client> {
        Ok(Client::builder()
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .build()?)
    }
}

fn ensure_ok(response: &Response) -> RemoteAudioResult<()> {
    let status = response.status();
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(RemoteAudioError::http_status(
            status.as_u16(),
            status.canonical_reason(),
        ))
    }
}

fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// `Content-Length` reported by a HEAD request to `url`.
pub fn get_http_size(url: &str, config: &HttpConfig) -> RemoteAudioResult<u64> {
    let response = config.client()?.head(url).send()?;
    ensure_ok(&response)?;
    content_length(&response)
        .ok_or_else(|| RemoteAudioError::HttpIo(format!("no Content-Length for {url}")))
}

/// Stream a WAV resource into a new [`StreamIO`].
///
/// The request is sent and the first chunk read before returning, so a
/// non-200 status or an invalid header is reported here. The declared total
/// is the header's `Subchunk2Size`, capped by `Content-Length` when the
/// server sends one.
pub fn from_http(
    url: &str,
    config: &HttpConfig,
    on_complete: Option<CompletionCallback>,
) -> RemoteAudioResult<Arc<StreamIO>> {
    let mut response = config.client()?.get(url).send()?;
    ensure_ok(&response)?;
    let length = content_length(&response);

    let chunk_size = config.chunk_size.max(MIN_CHUNK_SIZE);
    let mut initial = vec![0u8; chunk_size];
    let read =
        read_full(&mut response, &mut initial).map_err(|e| RemoteAudioError::HttpIo(e.to_string()))?;
    initial.truncate(read);

    let header = WavHeader::from_bytes(&initial)?;
    header.validate()?;
    let header_size = header.header_size()? as u64;
    let data_total = match length {
        Some(length) => header.data_size()?.min(length.saturating_sub(header_size)),
        None => header.data_size()?,
    };

    tracing::debug!(
        url,
        content_length = ?length,
        header_size,
        data_total,
        "Streaming WAV over HTTP"
    );

    let io = Arc::new(StreamIO::with_initial(&initial, Some(data_total)));
    spawn_feeder(
        "remote-audio-http",
        response,
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
    use crate::wav::WavSpec;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Serve one canned response per accepted connection, returning the base URL.
    fn serve(responses: Vec<(String, Vec<u8>)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            for (status_line, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                        break;
                    }
                }

                let mut stream = reader.into_inner();
                let head = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                stream.write_all(head.as_bytes()).unwrap();
                if !request_line.starts_with("HEAD") {
                    stream.write_all(&body).unwrap();
                }
            }
        });

        format!("http://{addr}")
    }

    fn wav_body(payload_len: usize) -> Vec<u8> {
        let mut body = WavHeader::synthesize(payload_len as u32, WavSpec::default()).construct();
        body.extend((0..payload_len).map(|i| (i % 7) as u8));
        body
    }

    #[test]
    fn test_from_http_streams_body() {
        let body = wav_body(300_000);
        let url = serve(vec![("200 OK".to_string(), body.clone())]);
        let (tx, rx) = mpsc::channel();

        let config = HttpConfig {
            chunk_size: 4096,
            ..HttpConfig::default()
        };
        let io = from_http(
            &format!("{url}/tone.wav"),
            &config,
            Some(Box::new(move |total| {
                let _ = tx.send(total);
            })),
        )
        .unwrap();

        assert_eq!(io.bytes_total(), Some(300_000));
        let total = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(total, body.len() as u64);
        assert_eq!(io.read_all(), body);
    }

    #[test]
    fn test_stalled_body_ends_feeder() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let body = wav_body(10_000);

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body[..144]).unwrap();

            // Send nothing more and wait for the client to hang up.
            stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
            let started = std::time::Instant::now();
            let mut scratch = [0u8; 16];
            let closed = matches!(std::io::Read::read(&mut stream, &mut scratch), Ok(0) | Err(_));
            (closed, started.elapsed())
        });

        let config = HttpConfig {
            timeout: Duration::from_millis(300),
            chunk_size: 144,
        };
        let (tx, rx) = mpsc::channel::<u64>();
        let io = from_http(
            &format!("http://{addr}/stall.wav"),
            &config,
            Some(Box::new(move |total| {
                let _ = tx.send(total);
            })),
        )
        .unwrap();
        assert_eq!(io.bytes_written(), 144);

        // The feeder gives up without reporting completion.
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        );
        assert_eq!(io.bytes_written(), 144);

        let (closed, waited) = server.join().unwrap();
        assert!(closed);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_from_http_not_found() {
        let url = serve(vec![("404 Not Found".to_string(), b"missing".to_vec())]);

        let err = from_http(&format!("{url}/missing.wav"), &HttpConfig::default(), None).unwrap_err();
        assert!(matches!(
            err,
            RemoteAudioError::HttpStatus { status: 404, ref reason } if reason == "Not Found"
        ));
    }

    #[test]
    fn test_from_http_rejects_non_wav() {
        let url = serve(vec![("200 OK".to_string(), vec![b'<'; 512])]);

        let err = from_http(&format!("{url}/page.html"), &HttpConfig::default(), None).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_get_http_size() {
        let url = serve(vec![("200 OK".to_string(), wav_body(1000))]);
        assert_eq!(
            get_http_size(&format!("{url}/tone.wav"), &HttpConfig::default()).unwrap(),
            1044
        );
    }

    #[test]
    fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = from_http(&format!("http://{addr}/a.wav"), &HttpConfig::default(), None).unwrap_err();
        assert!(matches!(err, RemoteAudioError::HttpIo(_)));
    }
}
