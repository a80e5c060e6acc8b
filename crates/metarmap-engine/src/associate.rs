//! Station association: pairing flight-category values with the station
//! identifier most recently seen in the stream.
//!
//! The document interleaves many fields per station; the only ordering
//! guarantee the engine relies on is that a station's `station_id` tag
//! precedes its `flight_category` tag. The associator holds a single
//! "current station" slot: every station-identifier event replaces it, and
//! every flight-category event resolves against it. A station that never
//! reports a category simply stays Unknown for the cycle.

use tracing::{debug, trace};

use metarmap_core::{FlightCategory, StationId};

use crate::registry::AirportRegistry;
use crate::scanner::TagEvent;

/// Leaf tag carrying the ICAO station identifier.
pub const STATION_TAG: &str = "station_id";

/// Leaf tag carrying the flight-category label.
pub const CATEGORY_TAG: &str = "flight_category";

/// Single-slot association context, reset at the start of every cycle.
#[derive(Debug, Default)]
pub struct StationAssociator {
    current: Option<StationId>,
}

impl StationAssociator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the current-station slot. Called at cycle start.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// The station currently being described by the stream, if any.
    pub fn current(&self) -> Option<StationId> {
        self.current
    }

    /// Apply one scanner event to the registry.
    pub fn apply(&mut self, event: &TagEvent, registry: &mut AirportRegistry) {
        match event.name.as_str() {
            STATION_TAG => match event.value.parse::<StationId>() {
                Ok(station) => {
                    self.current = Some(station);
                    // Safety default: if this station's report carries no
                    // category tag, it must end the cycle as Unknown.
                    if registry.set_category(station, FlightCategory::Unknown) {
                        trace!(station = %station, "station report started");
                    } else {
                        debug!(station = %station, "station not tracked, ignoring");
                    }
                }
                Err(e) => {
                    debug!(value = %event.value, error = %e, "bad station identifier");
                    self.current = None;
                }
            },
            CATEGORY_TAG => {
                let Some(station) = self.current else {
                    debug!(value = %event.value, "flight category with no station, dropping");
                    return;
                };
                let category = event
                    .value
                    .parse::<FlightCategory>()
                    .unwrap_or(FlightCategory::Unknown);
                if registry.set_category(station, category) {
                    debug!(station = %station, %category, "classified");
                }
            }
            // The scanner only emits watched names; anything else here is a
            // caller wiring mistake and is ignored.
            _ => {}
        }
    }
}
