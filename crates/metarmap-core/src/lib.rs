//! metarmap-core: Core traits, types, and error definitions for metarmap.
//!
//! This crate defines the transport- and hardware-agnostic abstractions the
//! weather engine is built on. The engine crate depends on these types
//! without pulling in any HTTP client or LED driver.
//!
//! # Key types
//!
//! - [`Transport`] / [`FeedStream`] -- byte-level access to the weather feed
//! - [`DisplaySink`] -- the LED strip seam
//! - [`StationId`], [`FlightCategory`], [`Color`] -- the domain vocabulary
//! - [`Error`] / [`Result`] -- error handling

pub mod display;
pub mod error;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use metarmap_core::*`.
pub use display::DisplaySink;
pub use error::{Error, Result};
pub use transport::{FeedStream, Transport};
pub use types::{Color, FlightCategory, ParseCategoryError, ParseStationError, StationId};
