//! The set of tracked airports and their current classifications.
//!
//! Built once at startup from the static station list; membership and
//! display-slot assignment never change afterwards. Only the per-airport
//! flight category mutates: reset to Unknown at the start of every fetch
//! cycle, then overwritten by association events (last write wins within a
//! cycle).

use std::collections::HashMap;

use metarmap_core::{Error, FlightCategory, Result, StationId};

/// One tracked airport: stable identity, fixed display slot, current
/// classification.
#[derive(Debug, Clone)]
pub struct Airport {
    /// ICAO code, the unique key.
    pub icao: StationId,
    /// Index into the output device, assigned once at construction.
    pub slot: usize,
    /// Current flight-category classification.
    pub category: FlightCategory,
}

/// The tracked-airport set, indexed by ICAO code.
///
/// Slots are a dense `0..N-1` range in construction order, so the registry
/// order is the display order and also the query order.
#[derive(Debug, Clone)]
pub struct AirportRegistry {
    airports: Vec<Airport>,
    index: HashMap<StationId, usize>,
}

impl AirportRegistry {
    /// Build a registry from an ordered station list; slot = list index.
    ///
    /// Duplicate codes are a configuration error.
    pub fn new(stations: &[StationId]) -> Result<Self> {
        let mut airports = Vec::with_capacity(stations.len());
        let mut index = HashMap::with_capacity(stations.len());
        for (slot, &icao) in stations.iter().enumerate() {
            if index.insert(icao, slot).is_some() {
                return Err(Error::Config(format!("duplicate station {icao}")));
            }
            airports.push(Airport {
                icao,
                slot,
                category: FlightCategory::Unknown,
            });
        }
        Ok(AirportRegistry { airports, index })
    }

    /// Build a registry from raw code strings (e.g. CLI input).
    pub fn from_codes<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stations = codes
            .into_iter()
            .map(|c| {
                c.as_ref()
                    .parse::<StationId>()
                    .map_err(|e| Error::Config(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(&stations)
    }

    /// Number of tracked airports.
    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Iterate airports in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Airport> {
        self.airports.iter()
    }

    /// Look up an airport by ICAO code.
    pub fn get(&self, icao: StationId) -> Option<&Airport> {
        self.index.get(&icao).map(|&slot| &self.airports[slot])
    }

    /// Current classification of a tracked airport.
    pub fn category_of(&self, icao: StationId) -> Option<FlightCategory> {
        self.get(icao).map(|a| a.category)
    }

    /// Set the classification of a tracked airport.
    ///
    /// Returns `false` (and changes nothing) if the station is not
    /// tracked -- the feed routinely carries airports outside the set.
    pub fn set_category(&mut self, icao: StationId, category: FlightCategory) -> bool {
        match self.index.get(&icao) {
            Some(&slot) => {
                self.airports[slot].category = category;
                true
            }
            None => false,
        }
    }

    /// Reset every airport to Unknown. Called at the start of each fetch
    /// cycle so a failed fetch never leaves stale classifications visible.
    pub fn reset(&mut self) {
        for airport in &mut self.airports {
            airport.category = FlightCategory::Unknown;
        }
    }

    /// The station query: all tracked codes, comma-joined, in slot order.
    pub fn query(&self) -> String {
        let codes: Vec<&str> = self.airports.iter().map(|a| a.icao.as_str()).collect();
        codes.join(",")
    }
}
