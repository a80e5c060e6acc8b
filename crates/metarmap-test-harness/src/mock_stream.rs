//! Scripted mock transport for deterministic fetch-cycle testing.
//!
//! [`MockTransport`] hands out [`MockFeedStream`]s that replay a script of
//! [`FeedStep`]s: byte chunks, stalls (idle timeout), and stream cutoffs.
//! Each call to `open()` consumes the next enqueued script, so multi-cycle
//! tests can give every cycle its own document.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use metarmap_core::{Error, FeedStream, Result, Transport};

/// One scripted step of a mock stream.
#[derive(Debug, Clone)]
pub enum FeedStep {
    /// Deliver these bytes. If the caller's buffer is smaller than the
    /// chunk, the remainder is re-queued for the next read.
    Chunk(Vec<u8>),
    /// Simulate the idle timeout expiring: the read returns
    /// [`Error::Timeout`].
    Silence,
    /// Simulate the peer closing the stream: the read returns
    /// [`Error::ConnectionLost`] and the stream reports closed.
    End,
}

/// A mock [`Transport`] replaying pre-scripted documents.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// One script per expected `open()` call, consumed in order.
    scripts: VecDeque<Vec<FeedStep>>,
    /// When set, `open()` fails with a transport error.
    refuse_open: bool,
    /// Queries passed to `open()`, in call order.
    opened: Vec<String>,
}

impl MockTransport {
    /// Create a mock transport with no scripts enqueued.
    ///
    /// A stream opened with no script behaves like a silent peer: every
    /// read times out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue the script for the next `open()` call.
    pub fn enqueue_steps(&mut self, steps: Vec<FeedStep>) {
        self.scripts.push_back(steps);
    }

    /// Enqueue a complete document split into `chunk_len`-byte chunks,
    /// followed by a stream end.
    pub fn enqueue_document(&mut self, doc: &[u8], chunk_len: usize) {
        let mut steps: Vec<FeedStep> = doc
            .chunks(chunk_len.max(1))
            .map(|c| FeedStep::Chunk(c.to_vec()))
            .collect();
        steps.push(FeedStep::End);
        self.scripts.push_back(steps);
    }

    /// Make every subsequent `open()` call fail.
    pub fn fail_open(&mut self) {
        self.refuse_open = true;
    }

    /// The query strings passed to `open()`, in call order.
    pub fn opened_queries(&self) -> &[String] {
        &self.opened
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self, query: &str) -> Result<Box<dyn FeedStream>> {
        if self.refuse_open {
            return Err(Error::Transport("mock transport refused open".into()));
        }
        self.opened.push(query.to_string());
        let steps = self.scripts.pop_front().unwrap_or_default();
        Ok(Box::new(MockFeedStream {
            steps: VecDeque::from(steps),
            open: true,
        }))
    }
}

/// The stream side of [`MockTransport`]: replays its script step by step.
#[derive(Debug)]
pub struct MockFeedStream {
    steps: VecDeque<FeedStep>,
    open: bool,
}

#[async_trait]
impl FeedStream for MockFeedStream {
    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        match self.steps.pop_front() {
            Some(FeedStep::Chunk(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    // Caller's buffer was smaller than the chunk; the rest
                    // comes back on the next read.
                    self.steps.push_front(FeedStep::Chunk(data[n..].to_vec()));
                }
                Ok(n)
            }
            Some(FeedStep::Silence) | None => Err(Error::Timeout),
            Some(FeedStep::End) => {
                self.open = false;
                Err(Error::ConnectionLost)
            }
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}
