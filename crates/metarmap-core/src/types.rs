//! Core types used throughout metarmap.
//!
//! The vocabulary of the domain: ICAO station identifiers, flight-category
//! classifications, and the display colors they map to.

use std::fmt;
use std::str::FromStr;

/// A four-letter ICAO station identifier (e.g. `KJFK`, `CYYZ`).
///
/// Stored as a fixed four-byte array so the type is `Copy` and hashable
/// without allocation; codes are uppercased on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationId([u8; 4]);

impl StationId {
    /// Return the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII alphanumerics.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string cannot be parsed into a [`StationId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStationError(String);

impl fmt::Display for ParseStationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid station identifier: {:?}", self.0)
    }
}

impl std::error::Error for ParseStationError {}

impl FromStr for StationId {
    type Err = ParseStationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ParseStationError(s.to_string()));
        }
        let mut code = [0u8; 4];
        for (i, b) in s.bytes().enumerate() {
            code[i] = b.to_ascii_uppercase();
        }
        Ok(StationId(code))
    }
}

/// Flight-category classification derived from a METAR report.
///
/// The four standard aviation visibility/ceiling categories, plus
/// [`Unknown`](FlightCategory::Unknown) for stations with no current
/// report or an unrecognized category string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlightCategory {
    /// Visual flight rules.
    Vfr,
    /// Marginal visual flight rules.
    Mvfr,
    /// Instrument flight rules.
    Ifr,
    /// Low instrument flight rules.
    Lifr,
    /// No report, or an unrecognized category.
    #[default]
    Unknown,
}

impl FlightCategory {
    /// Map this category to its display color.
    ///
    /// Total and side-effect-free: the four known categories map to the
    /// conventional sectional-chart colors, everything else is off.
    pub fn color(self) -> Color {
        match self {
            FlightCategory::Vfr => Color::VFR,
            FlightCategory::Mvfr => Color::MVFR,
            FlightCategory::Ifr => Color::IFR,
            FlightCategory::Lifr => Color::LIFR,
            FlightCategory::Unknown => Color::OFF,
        }
    }
}

impl fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlightCategory::Vfr => "VFR",
            FlightCategory::Mvfr => "MVFR",
            FlightCategory::Ifr => "IFR",
            FlightCategory::Lifr => "LIFR",
            FlightCategory::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`FlightCategory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown flight category: {:?}", self.0)
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for FlightCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VFR" => Ok(FlightCategory::Vfr),
            "MVFR" => Ok(FlightCategory::Mvfr),
            "IFR" => Ok(FlightCategory::Ifr),
            "LIFR" => Ok(FlightCategory::Lifr),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// An RGB color value pushed to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// VFR: green.
    pub const VFR: Color = Color::new(0, 255, 0);
    /// MVFR: blue.
    pub const MVFR: Color = Color::new(0, 0, 255);
    /// IFR: red.
    pub const IFR: Color = Color::new(255, 0, 0);
    /// LIFR: magenta.
    pub const LIFR: Color = Color::new(255, 0, 255);
    /// Unknown / no report: LED off.
    pub const OFF: Color = Color::new(0, 0, 0);

    /// Create a color from raw channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}
