//! HTTP streaming transport to the aviation weather data server.
//!
//! One request per fetch cycle: a GET against the data-server retrieve
//! endpoint asking for the most recent METAR per tracked station, with the
//! response body consumed chunk-by-chunk rather than buffered whole. Each
//! chunk read is bounded by the caller's idle timeout; the end of the body
//! is reported as [`Error::ConnectionLost`], the same convention the
//! engine uses for any stream that simply stops.
//!
//! # Example
//!
//! ```no_run
//! use metarmap_core::{FeedStream, Transport};
//! use metarmap_transport::AddsTransport;
//! use std::time::Duration;
//!
//! # async fn example() -> metarmap_core::Result<()> {
//! let mut transport = AddsTransport::new()?;
//! let mut stream = transport.open("KJFK,KLAX").await?;
//!
//! let mut buf = [0u8; 256];
//! let n = stream.receive(&mut buf, Duration::from_secs(10)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::{Buf, Bytes};
use std::time::Duration;

use metarmap_core::{Error, FeedStream, Result, Transport};

/// The data-server retrieve endpoint.
pub const DEFAULT_BASE_URL: &str = "https://aviationweather.gov/api/data/dataserver";

/// Default connection timeout (5 seconds).
///
/// Generous enough for a cold TLS handshake on a home connection, short
/// enough that a dead server does not stall the polling loop.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default report lookback window, in hours.
const DEFAULT_HOURS_BEFORE_NOW: u32 = 3;

/// HTTP transport for the aviation weather data server.
///
/// Reused across fetch cycles; each [`open`](Transport::open) call issues
/// a fresh request and returns a one-shot [`HttpFeedStream`].
#[derive(Debug)]
pub struct AddsTransport {
    client: reqwest::Client,
    base_url: String,
    hours_before_now: u32,
}

impl AddsTransport {
    /// Create a transport against the public data server.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a transport against an alternate endpoint (e.g. a local
    /// test server).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(AddsTransport {
            client,
            base_url: base_url.to_string(),
            hours_before_now: DEFAULT_HOURS_BEFORE_NOW,
        })
    }

    /// Override the report lookback window.
    pub fn hours_before_now(mut self, hours: u32) -> Self {
        self.hours_before_now = hours;
        self
    }

    /// Compose the retrieve URL for a comma-joined station query.
    fn request_url(&self, query: &str) -> String {
        format!(
            "{}?requestType=retrieve&dataSource=metars&format=xml\
             &mostRecentForEachStation=true&hoursBeforeNow={}&stationString={}",
            self.base_url, self.hours_before_now, query
        )
    }
}

#[async_trait]
impl Transport for AddsTransport {
    async fn open(&mut self, query: &str) -> Result<Box<dyn FeedStream>> {
        let url = self.request_url(query);
        tracing::debug!(url = %url, "opening weather stream");

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "weather request failed");
            map_request_error(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "weather server rejected request");
            return Err(Error::Transport(format!(
                "server returned status {status}"
            )));
        }

        tracing::debug!(status = %status, "weather stream open");
        Ok(Box::new(HttpFeedStream {
            response: Some(response),
            pending: Bytes::new(),
        }))
    }
}

/// One open response body, consumed chunk-by-chunk.
///
/// Chunks larger than the caller's buffer are carried over in `pending`
/// and drained on subsequent reads before the next network chunk is
/// awaited.
#[derive(Debug)]
pub struct HttpFeedStream {
    /// The in-flight response, `None` once the body ends or `close()` is
    /// called.
    response: Option<reqwest::Response>,
    /// Bytes received but not yet handed to the caller.
    pending: Bytes,
}

#[async_trait]
impl FeedStream for HttpFeedStream {
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        // Drain carried-over bytes before touching the network.
        if !self.pending.is_empty() {
            let n = self.pending.len().min(buf.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.advance(n);
            return Ok(n);
        }

        let response = self.response.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, response.chunk()).await {
            Ok(Ok(Some(chunk))) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.pending = chunk.slice(n..);
                }
                Ok(n)
            }
            Ok(Ok(None)) => {
                // Body complete: the stream simply stops producing bytes.
                tracing::trace!("response body ended");
                self.response = None;
                Err(Error::ConnectionLost)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "body read failed");
                self.response = None;
                Err(Error::Transport(format!("body read failed: {e}")))
            }
            Err(_) => {
                tracing::trace!(timeout_ms = timeout.as_millis(), "no data within idle bound");
                Err(Error::Timeout)
            }
        }
    }

    fn is_open(&self) -> bool {
        self.response.is_some() || !self.pending.is_empty()
    }

    async fn close(&mut self) -> Result<()> {
        self.response = None;
        self.pending = Bytes::new();
        Ok(())
    }
}

/// Map a reqwest request error to the appropriate [`Error`] variant.
fn map_request_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else if e.is_connect() {
        Error::Transport(format!("connection failed: {e}"))
    } else {
        Error::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Helper: bind a listener on a random port and return it with a base
    /// URL pointing at it.
    async fn test_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, format!("http://{addr}/api/data/dataserver"))
    }

    /// Read the request head (through the blank line) from a socket.
    async fn read_request_head(stream: &mut tokio::net::TcpStream) -> String {
        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            let n = stream.read(&mut byte).await.unwrap();
            if n == 0 {
                break;
            }
            head.push(byte[0]);
        }
        String::from_utf8_lossy(&head).into_owned()
    }

    #[test]
    fn request_url_carries_query_and_lookback() {
        let transport = AddsTransport::with_base_url("http://example/ds")
            .unwrap()
            .hours_before_now(6);
        let url = transport.request_url("KJFK,KLAX");
        assert!(url.starts_with("http://example/ds?"));
        assert!(url.contains("stationString=KJFK,KLAX"));
        assert!(url.contains("hoursBeforeNow=6"));
        assert!(url.contains("format=xml"));
        assert!(url.contains("mostRecentForEachStation=true"));
    }

    #[tokio::test]
    async fn streams_body_to_completion() {
        let (listener, base_url) = test_listener().await;
        let body = b"<response><station_id>KJFK</station_id></response>";

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let head = read_request_head(&mut stream).await;
            assert!(head.contains("stationString=KJFK"));
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.write_all(body).await.unwrap();
            stream.flush().await.unwrap();
        });

        let mut transport = AddsTransport::with_base_url(&base_url).unwrap();
        let mut feed = transport.open("KJFK").await.unwrap();
        assert!(feed.is_open());

        let mut collected = Vec::new();
        let mut buf = [0u8; 16];
        loop {
            match feed.receive(&mut buf, Duration::from_secs(2)).await {
                Ok(n) => collected.extend_from_slice(&buf[..n]),
                Err(Error::ConnectionLost) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(collected, body);
        assert!(!feed.is_open());

        server.await.unwrap();
    }

    #[tokio::test]
    async fn stalled_body_times_out_without_closing() {
        let (listener, base_url) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request_head(&mut stream).await;
            // Promise more bytes than we send, then stall.
            stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n<resp")
                .await
                .unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut transport = AddsTransport::with_base_url(&base_url).unwrap();
        let mut feed = transport.open("KJFK").await.unwrap();

        let mut buf = [0u8; 64];
        // The first read gets the partial body.
        let n = feed.receive(&mut buf, Duration::from_secs(2)).await.unwrap();
        assert_eq!(&buf[..n], b"<resp");
        // Then the stall hits the idle bound.
        let err = feed
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));
        // A timeout does not tear the stream down; the next cycle decides.
        assert!(feed.is_open());

        feed.close().await.unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn error_status_fails_open() {
        let (listener, base_url) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request_head(&mut stream).await;
            stream
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\n\r\n")
                .await
                .unwrap();
            stream.flush().await.unwrap();
        });

        let mut transport = AddsTransport::with_base_url(&base_url).unwrap();
        let err = transport.open("KJFK").await.err().unwrap();
        match err {
            Error::Transport(msg) => assert!(msg.contains("503"), "got: {msg}"),
            other => panic!("expected Transport error, got: {other:?}"),
        }

        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused_fails_open() {
        // Bind and immediately drop so the port is not listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut transport =
            AddsTransport::with_base_url(&format!("http://{addr}/ds")).unwrap();
        let err = transport.open("KJFK").await.err().unwrap();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn small_caller_buffer_drains_pending_bytes() {
        let (listener, base_url) = test_listener().await;
        let body = b"0123456789abcdef";

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request_head(&mut stream).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.write_all(body).await.unwrap();
            stream.flush().await.unwrap();
        });

        let mut transport = AddsTransport::with_base_url(&base_url).unwrap();
        let mut feed = transport.open("KJFK").await.unwrap();

        // 3-byte reads force the leftover-bytes path regardless of how the
        // network delivered the chunks.
        let mut collected = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            match feed.receive(&mut buf, Duration::from_secs(2)).await {
                Ok(n) => collected.extend_from_slice(&buf[..n]),
                Err(Error::ConnectionLost) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(collected, body);

        server.await.unwrap();
    }

    #[tokio::test]
    async fn receive_after_close_is_not_connected() {
        let (listener, base_url) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request_head(&mut stream).await;
            stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n")
                .await
                .unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut transport = AddsTransport::with_base_url(&base_url).unwrap();
        let mut feed = transport.open("KJFK").await.unwrap();
        feed.close().await.unwrap();
        assert!(!feed.is_open());

        let mut buf = [0u8; 8];
        let err = feed
            .receive(&mut buf, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        server.abort();
    }
}
