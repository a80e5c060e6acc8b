//! metarmap-test-harness: scripted transports and recording display sinks
//! for deterministic testing of the weather engine.
//!
//! This crate provides [`MockTransport`] for driving fetch cycles with
//! pre-scripted byte streams (including stalls and mid-document cutoffs)
//! without any network, and [`MockDisplay`] for asserting on the exact
//! frames a cycle pushed to the LED seam.

pub mod mock_display;
pub mod mock_stream;

pub use mock_display::MockDisplay;
pub use mock_stream::{FeedStep, MockFeedStream, MockTransport};
