//! metarmap-transport: network transport implementations for metarmap.
//!
//! Provides [`AddsTransport`], the HTTP implementation of the
//! [`Transport`](metarmap_core::Transport) trait against the aviation
//! weather data server. The engine crate never touches HTTP directly; it
//! consumes the byte stream through the core traits.

pub mod http;

pub use http::{AddsTransport, HttpFeedStream, DEFAULT_BASE_URL};
