//! # metarmap -- METAR Flight-Category LED Map
//!
//! `metarmap` periodically retrieves aviation weather reports (METAR) for
//! a fixed set of airports and derives, for each one, its current
//! flight-category rule -- driving one addressable LED per airport to the
//! matching sectional-chart color. The heart of the library is an
//! incremental parser that consumes the data server's streaming document
//! in arbitrary-sized chunks under a per-read idle timeout, so a slow or
//! truncated feed degrades gracefully instead of failing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use metarmap::{AddsTransport, AirportRegistry, CycleConfig, FetchCycle};
//! # struct Strip;
//! # impl metarmap::DisplaySink for Strip {
//! #     fn set(&mut self, _: usize, _: metarmap::Color) {}
//! #     fn commit(&mut self) -> metarmap::Result<()> { Ok(()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> metarmap::Result<()> {
//!     let mut registry = AirportRegistry::from_codes(["KJFK", "KLAX"])?;
//!     let mut transport = AddsTransport::new()?;
//!     let mut display = Strip;
//!
//!     let mut cycle = FetchCycle::new(CycleConfig::default());
//!     let outcome = cycle.run(&mut transport, &mut registry, &mut display).await;
//!     println!("cycle: {outcome}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                   | Purpose                                    |
//! |-------------------------|--------------------------------------------|
//! | `metarmap-core`         | Traits ([`Transport`], [`DisplaySink`]), types, errors |
//! | `metarmap-engine`       | Tag scanner, registry, association, fetch cycle |
//! | `metarmap-transport`    | HTTP streaming transport to the data server |
//! | `metarmap-test-harness` | Mock transports and display sinks          |
//! | **`metarmap`**          | This facade crate -- re-exports everything |
//!
//! Application code programs against the core traits, so the same fetch
//! cycle runs over real HTTP in production and scripted mocks in tests.

pub use metarmap_core::*;

pub use metarmap_engine::{
    Airport, AirportRegistry, CycleConfig, CycleOutcome, FetchCycle, StationAssociator,
    TagEvent, TagScanner, CATEGORY_TAG, STATION_TAG,
};

pub use metarmap_transport::{AddsTransport, HttpFeedStream, DEFAULT_BASE_URL};
