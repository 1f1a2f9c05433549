//! Human-readable output for decoded snapshots.
//!
//! Two styles: a compact aircraft table, and labeled `field = value` lines
//! per state vector with Unix timestamps shown alongside their UTC time.

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat};
use comfy_table::{Cell, Table};

use opensky_core::state::FIELDS;
use opensky_core::{icao24_to_u32, DecodeOutcome, FeedSnapshot, StateVector};

/// `1700000000` -> `2023-11-14T22:13:20Z`.
pub fn format_unix(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn with_time(secs: i64) -> String {
    match format_unix(secs) {
        Some(t) => format!("{secs} ({t})"),
        None => secs.to_string(),
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "null".into())
}

fn quoted(v: Option<&str>) -> String {
    v.map(|s| format!("{s:?}")).unwrap_or_else(|| "null".into())
}

/// Field values in column order, ready for `name = value` output.
fn field_values(sv: &StateVector) -> [String; 18] {
    [
        sv.icao24.clone(),
        quoted(sv.callsign.as_deref()),
        quoted(Some(&sv.origin_country)),
        sv.time_position.map(with_time).unwrap_or_else(|| "null".into()),
        with_time(sv.last_contact),
        opt(sv.longitude),
        opt(sv.latitude),
        opt(sv.geo_altitude),
        sv.on_ground.to_string(),
        opt(sv.velocity),
        opt(sv.true_track),
        opt(sv.vertical_rate),
        match &sv.sensors {
            Some(serials) => {
                let items: Vec<String> = serials.iter().map(|s| opt(*s)).collect();
                format!("[{}]", items.join(", "))
            }
            None => "null".into(),
        },
        opt(sv.baro_altitude),
        quoted(sv.squawk.as_deref()),
        opt(sv.spi),
        sv.position_source
            .map(|p| format!("{} ({p})", p.code()))
            .unwrap_or_else(|| "null".into()),
        sv.category
            .map(|c| format!("{} ({c})", c.code()))
            .unwrap_or_else(|| "null".into()),
    ]
}

/// Labeled lines for one state vector.
pub fn format_vector(sv: &StateVector) -> String {
    let mut out = String::new();
    for (name, value) in FIELDS.iter().zip(field_values(sv)) {
        let _ = writeln!(out, "    {name} = {value}");
    }
    out
}

/// Labeled lines for a whole snapshot.
pub fn format_lines(snapshot: &FeedSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "TIME = {}",
        i64::try_from(snapshot.timestamp)
            .map(with_time)
            .unwrap_or_else(|_| snapshot.timestamp.to_string())
    );
    for (n, sv) in snapshot.vectors.iter().enumerate() {
        let _ = writeln!(out, "AIRPLANE[{}]:", n + 1);
        out.push_str(&format_vector(sv));
    }
    out
}

/// Summary table, sorted by ICAO address.
pub fn format_table(snapshot: &FeedSnapshot) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "ICAO24", "Callsign", "Country", "Lat", "Lon", "Alt (m)", "Speed (m/s)", "Track",
        "VRate", "Gnd", "Squawk", "Source", "Category",
    ]);

    let mut sorted: Vec<_> = snapshot.vectors.iter().collect();
    sorted.sort_by_key(|sv| (icao24_to_u32(&sv.icao24), sv.icao24.clone()));

    for sv in sorted {
        table.add_row(vec![
            Cell::new(&sv.icao24),
            Cell::new(sv.callsign_trimmed().unwrap_or("-")),
            Cell::new(&sv.origin_country),
            Cell::new(sv.latitude.map(|l| format!("{l:.4}")).unwrap_or("-".into())),
            Cell::new(sv.longitude.map(|l| format!("{l:.4}")).unwrap_or("-".into())),
            Cell::new(
                sv.baro_altitude
                    .or(sv.geo_altitude)
                    .map(|a| format!("{a:.0}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(sv.velocity.map(|v| format!("{v:.1}")).unwrap_or("-".into())),
            Cell::new(sv.true_track.map(|h| format!("{h:.1}")).unwrap_or("-".into())),
            Cell::new(
                sv.vertical_rate
                    .map(|v| format!("{v:+.1}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(if sv.on_ground { "yes" } else { "no" }),
            Cell::new(sv.squawk.as_deref().unwrap_or("-")),
            Cell::new(
                sv.position_source
                    .map(|p| p.to_string())
                    .unwrap_or("-".into()),
            ),
            Cell::new(sv.category.map(|c| c.to_string()).unwrap_or("-".into())),
        ]);
    }

    table
}

/// One-line summary of a decode.
pub fn format_summary(outcome: &DecodeOutcome) -> String {
    let snapshot = &outcome.snapshot;
    let time = i64::try_from(snapshot.timestamp)
        .ok()
        .and_then(format_unix)
        .unwrap_or_else(|| snapshot.timestamp.to_string());
    format!(
        "Snapshot {time}: {} aircraft, {} rejected",
        snapshot.vectors.len(),
        outcome.rejected.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DecodeOutcome {
        opensky_core::decode_str(
            r#"{"time":1700000000,"states":[
                ["4b1815","SWR736  ","Switzerland",1700000000,1700000003,8.5481,47.4517,1120.14,false,118.3,254.37,-4.23,[100,null],1097.28,"1000",false,0,4],
                ["3c6444",null,"Germany",null,1700000001,null,null,null,true]
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_format_unix() {
        assert_eq!(format_unix(1_700_000_000).as_deref(), Some("2023-11-14T22:13:20Z"));
        assert_eq!(format_unix(0).as_deref(), Some("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_format_vector_lines() {
        let out = sample();
        let text = format_vector(&out.snapshot.vectors[0]);
        assert!(text.contains("    icao24 = 4b1815\n"));
        assert!(text.contains("    callsign = \"SWR736  \"\n"));
        assert!(text.contains("    time_position = 1700000000 (2023-11-14T22:13:20Z)\n"));
        assert!(text.contains("    sensors = [100, null]\n"));
        assert!(text.contains("    position_source = 0 (ADS-B)\n"));
        assert!(text.contains("    category = 4 (Large (75000 to 300000 lbs))\n"));
        assert_eq!(text.lines().count(), 18);
    }

    #[test]
    fn test_format_vector_nulls() {
        let out = sample();
        let text = format_vector(&out.snapshot.vectors[1]);
        assert!(text.contains("    callsign = null\n"));
        assert!(text.contains("    time_position = null\n"));
        assert!(text.contains("    spi = null\n"));
        assert!(text.contains("    on_ground = true\n"));
    }

    #[test]
    fn test_format_lines_header() {
        let out = sample();
        let text = format_lines(&out.snapshot);
        assert!(text.starts_with("TIME = 1700000000 (2023-11-14T22:13:20Z)\nAIRPLANE[1]:\n"));
        assert!(text.contains("AIRPLANE[2]:\n"));
    }

    #[test]
    fn test_format_table_sorted() {
        let out = sample();
        let rendered = format_table(&out.snapshot).to_string();
        let first = rendered.find("3c6444").unwrap();
        let second = rendered.find("4b1815").unwrap();
        assert!(first < second);
        assert!(rendered.contains("SWR736"));
    }

    #[test]
    fn test_format_summary() {
        let out = sample();
        assert_eq!(
            format_summary(&out),
            "Snapshot 2023-11-14T22:13:20Z: 2 aircraft, 0 rejected"
        );
    }
}
