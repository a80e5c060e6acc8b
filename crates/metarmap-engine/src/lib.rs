//! metarmap-engine: the weather-ingestion state engine.
//!
//! Consumes a streaming, tag-structured METAR document in arbitrary-sized
//! chunks and derives, for each tracked airport, its current
//! flight-category classification.
//!
//! # Pipeline
//!
//! ```text
//! FeedStream bytes -> TagScanner -> TagEvent -> StationAssociator
//!                                                     |
//!                                    AirportRegistry <-+
//!                                          |
//!                                    DisplaySink (colors)
//! ```
//!
//! [`FetchCycle`] orchestrates one end-to-end polling cycle over these
//! pieces under a per-read idle timeout.

pub mod associate;
pub mod cycle;
pub mod registry;
pub mod scanner;

pub use associate::{StationAssociator, CATEGORY_TAG, STATION_TAG};
pub use cycle::{CycleConfig, CycleOutcome, FetchCycle};
pub use registry::{Airport, AirportRegistry};
pub use scanner::{TagEvent, TagScanner};
