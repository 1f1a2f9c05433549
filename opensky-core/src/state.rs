//! Decode a parsed feed document into typed state vectors.
//!
//! The document is `{"time": <int>, "states": [[...], ...]}`. Each inner
//! array holds up to 18 positional columns:
//!
//! | idx | field           | type        | required |
//! |-----|-----------------|-------------|----------|
//! | 0   | icao24          | string      | yes      |
//! | 1   | callsign        | string      |          |
//! | 2   | origin_country  | string      | yes      |
//! | 3   | time_position   | int         |          |
//! | 4   | last_contact    | int         | yes      |
//! | 5   | longitude       | float       |          |
//! | 6   | latitude        | float       |          |
//! | 7   | geo_altitude    | float       |          |
//! | 8   | on_ground       | bool        | yes      |
//! | 9   | velocity        | float       |          |
//! | 10  | true_track      | float       |          |
//! | 11  | vertical_rate   | float       |          |
//! | 12  | sensors         | [int\|null] |          |
//! | 13  | baro_altitude   | float       |          |
//! | 14  | squawk          | string      |          |
//! | 15  | spi             | bool        | yes      |
//! | 16  | position_source | int 0-3     | yes      |
//! | 17  | category        | int 0-20    | yes      |
//!
//! Columns 0-8 must always be present. Rows may stop anywhere after that:
//! missing trailing columns decode as absent, and so does `null` in an
//! optional column. `null` in a required column is an error. Columns past 17
//! are ignored. A bad vector is reported with its index and skipped; the rest
//! of the document still decodes.

use log::{debug, warn};

use crate::json::{self, Value};
use crate::types::*;

/// Column names in feed order.
pub const FIELDS: [&str; 18] = [
    "icao24",
    "callsign",
    "origin_country",
    "time_position",
    "last_contact",
    "longitude",
    "latitude",
    "geo_altitude",
    "on_ground",
    "velocity",
    "true_track",
    "vertical_rate",
    "sensors",
    "baro_altitude",
    "squawk",
    "spi",
    "position_source",
    "category",
];

/// Every row carries at least `icao24..=on_ground`.
pub const MANDATORY_COLUMNS: usize = 9;

const TOP_LEVEL_KEYS: [&str; 2] = ["time", "states"];

// ---------------------------------------------------------------------------
// Document decoding
// ---------------------------------------------------------------------------

/// Parse and decode a full document body.
pub fn decode_str(text: &str) -> Result<DecodeOutcome> {
    let value = json::parse(text)?;
    Ok(decode(&value)?)
}

/// Decode a parsed document.
///
/// Fails only when the top level is wrong (`time`/`states` shape). Individual
/// state vectors that fail are collected in `DecodeOutcome::rejected`.
pub fn decode(value: &Value) -> std::result::Result<DecodeOutcome, DecodeError> {
    let pairs = value.as_object().ok_or(DecodeError::UnexpectedSchema)?;
    if pairs.iter().any(|(k, _)| !TOP_LEVEL_KEYS.contains(&k.as_str())) {
        return Err(DecodeError::UnexpectedSchema);
    }
    let (Some(time), Some(states)) = (value.get("time"), value.get("states")) else {
        return Err(DecodeError::UnexpectedSchema);
    };

    let timestamp = time
        .as_number()
        .and_then(json::Number::as_u64)
        .ok_or(DecodeError::InvalidField("time"))?;

    // An empty area comes back as `"states": null`.
    let rows: &[Value] = match states {
        Value::Null => &[],
        Value::Array(rows) => rows,
        _ => return Err(DecodeError::NotAnArray("states")),
    };

    let mut vectors = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match decode_state_vector(row, index) {
            Ok(sv) => vectors.push(sv),
            Err(e) => {
                warn!("rejected state vector {index}: {e}");
                rejected.push((index, e));
            }
        }
    }

    debug!(
        "decoded snapshot at {timestamp}: {} vectors, {} rejected",
        vectors.len(),
        rejected.len()
    );

    Ok(DecodeOutcome {
        snapshot: FeedSnapshot { timestamp, vectors },
        rejected,
    })
}

/// Decode one element of `states`. `index` is its position, used in errors.
pub fn decode_state_vector(
    row: &Value,
    index: usize,
) -> std::result::Result<StateVector, DecodeError> {
    let items = row
        .as_array()
        .ok_or(DecodeError::NotAnArray("state vector"))?;
    let row = Row { items, index };

    let icao24 = row.string(0)?;
    let icao24 = normalize_icao24(&icao24).ok_or(DecodeError::InvalidField(FIELDS[0]))?;

    Ok(StateVector {
        icao24,
        callsign: row.opt_string(1)?,
        origin_country: row.string(2)?,
        time_position: row.opt_int(3)?,
        last_contact: row.int(4)?,
        longitude: row.opt_float(5)?,
        latitude: row.opt_float(6)?,
        geo_altitude: row.opt_float(7)?,
        on_ground: row.boolean(8)?,
        velocity: row.opt_float(9)?,
        true_track: row.opt_float(10)?,
        vertical_rate: row.opt_float(11)?,
        sensors: row.sensors(12)?,
        baro_altitude: row.opt_float(13)?,
        squawk: row.opt_string(14)?,
        spi: row.tail(15, Row::boolean)?,
        position_source: row.tail(16, |r, col| {
            PositionSource::from_code(r.code(col)?).ok_or(DecodeError::InvalidField(FIELDS[col]))
        })?,
        category: row.tail(17, |r, col| {
            AircraftCategory::from_code(r.code(col)?)
                .ok_or(DecodeError::InvalidField(FIELDS[col]))
        })?,
    })
}

// ---------------------------------------------------------------------------
// Positional column access
// ---------------------------------------------------------------------------

type FieldResult<T> = std::result::Result<T, DecodeError>;

/// One state vector's columns plus its index in `states`.
struct Row<'a> {
    items: &'a [Value],
    index: usize,
}

impl<'a> Row<'a> {
    /// Column value, or `None` if missing or `null`.
    fn get(&self, col: usize) -> Option<&'a Value> {
        self.items.get(col).filter(|v| !v.is_null())
    }

    fn require(&self, col: usize) -> FieldResult<&'a Value> {
        self.get(col)
            .ok_or(DecodeError::RequiredFieldMissing(FIELDS[col], self.index))
    }

    /// Required column past the mandatory prefix: `None` if the row ends
    /// before it, otherwise decoded with `f` (which rejects `null`).
    fn tail<T>(
        &self,
        col: usize,
        f: impl FnOnce(&Self, usize) -> FieldResult<T>,
    ) -> FieldResult<Option<T>> {
        if col >= MANDATORY_COLUMNS && col >= self.items.len() {
            return Ok(None);
        }
        f(self, col).map(Some)
    }

    fn convert<T>(
        &self,
        col: usize,
        value: &'a Value,
        f: impl FnOnce(&'a Value) -> Option<T>,
    ) -> FieldResult<T> {
        f(value).ok_or(DecodeError::InvalidField(FIELDS[col]))
    }

    fn optional<T>(
        &self,
        col: usize,
        f: impl FnOnce(&'a Value) -> Option<T>,
    ) -> FieldResult<Option<T>> {
        self.get(col).map(|v| self.convert(col, v, f)).transpose()
    }

    fn string(&self, col: usize) -> FieldResult<String> {
        self.convert(col, self.require(col)?, as_string)
    }

    fn opt_string(&self, col: usize) -> FieldResult<Option<String>> {
        self.optional(col, as_string)
    }

    fn int(&self, col: usize) -> FieldResult<i64> {
        self.convert(col, self.require(col)?, as_int)
    }

    fn opt_int(&self, col: usize) -> FieldResult<Option<i64>> {
        self.optional(col, as_int)
    }

    fn opt_float(&self, col: usize) -> FieldResult<Option<f64>> {
        self.optional(col, |v| v.as_number()?.as_f64())
    }

    fn boolean(&self, col: usize) -> FieldResult<bool> {
        self.convert(col, self.require(col)?, Value::as_bool)
    }

    /// Small enum code column.
    fn code(&self, col: usize) -> FieldResult<u8> {
        self.convert(col, self.require(col)?, |v| {
            u8::try_from(as_int(v)?).ok()
        })
    }

    /// Nested array of serials; `null` elements are kept as `None`.
    fn sensors(&self, col: usize) -> FieldResult<Option<Vec<Option<i64>>>> {
        self.optional(col, |v| {
            v.as_array()?
                .iter()
                .map(|s| match s {
                    Value::Null => Some(None),
                    other => as_int(other).map(Some),
                })
                .collect()
        })
    }
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn as_int(value: &Value) -> Option<i64> {
    value.as_number()?.as_i64()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
