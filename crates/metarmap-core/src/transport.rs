//! Transport traits for fetching the streaming weather document.
//!
//! [`Transport`] abstracts over how a METAR document stream is opened
//! (HTTP to the aviation weather data server in production, scripted mocks
//! in tests); [`FeedStream`] is the byte-level read side of one open
//! document.
//!
//! The fetch cycle operates on these traits rather than on a concrete HTTP
//! client, enabling both real network fetches and deterministic unit
//! testing with `MockTransport` from the `metarmap-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Opens a fresh document stream for one fetch cycle.
///
/// Each cycle opens its own stream: the weather document is a one-shot
/// response, not a long-lived duplex link, and there is no end-of-document
/// marker the engine can rely on -- the stream may simply stop producing
/// bytes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a read stream for the given station query.
    ///
    /// `query` is the comma-joined list of tracked ICAO codes in registry
    /// order. Returns [`Error::Transport`](crate::error::Error::Transport)
    /// if the connection cannot be established or the server refuses the
    /// request.
    async fn open(&mut self, query: &str) -> Result<Box<dyn FeedStream>>;
}

/// Byte-level read side of one open weather document.
#[async_trait]
pub trait FeedStream: Send {
    /// Read available bytes into the provided buffer.
    ///
    /// Returns the number of bytes actually read (possibly fewer than the
    /// buffer holds, never more). Waits up to `timeout` for data to
    /// arrive; returns [`Error::Timeout`](crate::error::Error::Timeout) if
    /// nothing arrives within the bound, and
    /// [`Error::ConnectionLost`](crate::error::Error::ConnectionLost) when
    /// the stream ends.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Check whether the stream still has (or may still produce) bytes.
    fn is_open(&self) -> bool;

    /// Close the stream.
    ///
    /// After calling `close()`, subsequent `receive()` calls should return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;
}
