//! Shared types, error enums, and decoded feed records for opensky-core.

use thiserror::Error;

/// Lexical or structural failure while reading the document text.
///
/// Every variant carries the byte offset into the input where the problem
/// was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected character {1:?} at offset {0}")]
    UnexpectedChar(usize, char),
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEnd(usize),
    #[error("invalid string starting at offset {0}")]
    InvalidString(usize),
    #[error("invalid number at offset {0}")]
    InvalidNumber(usize),
    #[error("trailing data at offset {0}")]
    TrailingData(usize),
}

/// Semantic failure while mapping a parsed tree onto the feed schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected document schema: expected exactly `time` and `states`")]
    UnexpectedSchema,
    #[error("invalid value for field `{0}`")]
    InvalidField(&'static str),
    #[error("required field `{0}` missing in state vector {1}")]
    RequiredFieldMissing(&'static str, usize),
    #[error("expected an array for {0}")]
    NotAnArray(&'static str),
}

/// All errors produced by opensky-core.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FeedError>;

// ---------------------------------------------------------------------------
// Position source
// ---------------------------------------------------------------------------

/// Origin of a state vector's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionSource {
    AdsB,
    Asterix,
    Mlat,
    Flarm,
}

impl PositionSource {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PositionSource::AdsB),
            1 => Some(PositionSource::Asterix),
            2 => Some(PositionSource::Mlat),
            3 => Some(PositionSource::Flarm),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSource::AdsB => write!(f, "ADS-B"),
            PositionSource::Asterix => write!(f, "ASTERIX"),
            PositionSource::Mlat => write!(f, "MLAT"),
            PositionSource::Flarm => write!(f, "FLARM"),
        }
    }
}

// ---------------------------------------------------------------------------
// Aircraft category
// ---------------------------------------------------------------------------

/// Emitter category reported in slot 17, as a raw code in `0..=20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AircraftCategory(u8);

/// Category code table.
pub const CATEGORY_TABLE: [&str; 21] = [
    "No information at all",
    "No ADS-B emitter category information",
    "Light (< 15500 lbs)",
    "Small (15500 to 75000 lbs)",
    "Large (75000 to 300000 lbs)",
    "High vortex large",
    "Heavy (> 300000 lbs)",
    "High performance (> 5g acceleration and 400 kts)",
    "Rotorcraft",
    "Glider / sailplane",
    "Lighter-than-air",
    "Parachutist / skydiver",
    "Ultralight / hang-glider / paraglider",
    "Reserved",
    "Unmanned aerial vehicle",
    "Space / trans-atmospheric vehicle",
    "Surface vehicle - emergency vehicle",
    "Surface vehicle - service vehicle",
    "Point obstacle (includes tethered balloons)",
    "Cluster obstacle",
    "Line obstacle",
];

impl AircraftCategory {
    pub fn from_code(code: u8) -> Option<Self> {
        if (code as usize) < CATEGORY_TABLE.len() {
            Some(AircraftCategory(code))
        } else {
            None
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn description(self) -> &'static str {
        CATEGORY_TABLE[self.0 as usize]
    }
}

impl std::fmt::Display for AircraftCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

// ---------------------------------------------------------------------------
// Decoded records
// ---------------------------------------------------------------------------

/// State of one aircraft at the snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// ICAO 24-bit transponder address, lowercase hex.
    pub icao24: String,
    pub callsign: Option<String>,
    pub origin_country: String,
    /// Unix seconds of the last position report.
    pub time_position: Option<i64>,
    /// Unix seconds of the last message of any kind.
    pub last_contact: i64,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Geometric altitude in meters.
    pub geo_altitude: Option<f64>,
    pub on_ground: bool,
    /// Ground speed in m/s.
    pub velocity: Option<f64>,
    /// Degrees clockwise from north.
    pub true_track: Option<f64>,
    /// m/s, positive when climbing.
    pub vertical_rate: Option<f64>,
    /// Receiver serials; elements the feed reports as null stay `None`.
    pub sensors: Option<Vec<Option<i64>>>,
    /// Barometric altitude in meters.
    pub baro_altitude: Option<f64>,
    pub squawk: Option<String>,
    /// Special purpose indicator. `None` only when the row stops before it.
    pub spi: Option<bool>,
    /// `None` only when the row stops before it.
    pub position_source: Option<PositionSource>,
    /// `None` only when the row stops before it (feeds without `extended=1`).
    pub category: Option<AircraftCategory>,
}

impl StateVector {
    /// Callsign without the feed's trailing space padding.
    pub fn callsign_trimmed(&self) -> Option<&str> {
        self.callsign.as_deref().map(str::trim_end)
    }

    /// `(lat, lon)` when both are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// One decoded feed document.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    /// Unix seconds the feed reports for the whole document.
    pub timestamp: u64,
    pub vectors: Vec<StateVector>,
}

/// A decoded snapshot plus the state vectors that failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    pub snapshot: FeedSnapshot,
    /// `(index into states, error)` for every rejected vector.
    pub rejected: Vec<(usize, DecodeError)>,
}

impl DecodeOutcome {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ICAO address helpers
// ---------------------------------------------------------------------------

/// Normalize an ICAO24 hex string to lowercase. `None` if it is empty or not hex.
pub fn normalize_icao24(hex: &str) -> Option<String> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(hex.to_ascii_lowercase())
}

/// Parse an ICAO24 hex string into its 24-bit integer value.
pub fn icao24_to_u32(hex: &str) -> Option<u32> {
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
