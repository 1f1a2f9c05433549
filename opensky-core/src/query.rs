//! Build `states/all` request URLs for a geographic bounding box.

use crate::types::FeedError;

/// Public OpenSky endpoint for current state vectors.
pub const DEFAULT_BASE_URL: &str = "https://opensky-network.org/api/states/all";

/// Latitude/longitude box in WGS-84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lomin: f64,
    pub lamax: f64,
    pub lomax: f64,
}

impl BoundingBox {
    pub const fn new(lamin: f64, lomin: f64, lamax: f64, lomax: f64) -> Self {
        BoundingBox {
            lamin,
            lomin,
            lamax,
            lomax,
        }
    }

    /// Check coordinate ranges and ordering.
    pub fn validate(&self) -> Result<(), FeedError> {
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
        let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);

        if !lat_ok(self.lamin) || !lat_ok(self.lamax) {
            return Err(FeedError::Config(format!(
                "latitude out of range: {}..{}",
                self.lamin, self.lamax
            )));
        }
        if !lon_ok(self.lomin) || !lon_ok(self.lomax) {
            return Err(FeedError::Config(format!(
                "longitude out of range: {}..{}",
                self.lomin, self.lomax
            )));
        }
        if self.lamin > self.lamax || self.lomin > self.lomax {
            return Err(FeedError::Config(
                "bounding box minimum exceeds maximum".into(),
            ));
        }
        Ok(())
    }

    /// Parse `lamin,lomin,lamax,lomax`.
    pub fn parse(text: &str) -> Result<Self, FeedError> {
        let parts: Vec<f64> = text
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| FeedError::Config(format!("bad bounding box {text:?}: {e}")))?;

        let [lamin, lomin, lamax, lomax] = parts[..] else {
            return Err(FeedError::Config(format!(
                "bounding box needs 4 values, got {}",
                parts.len()
            )));
        };

        let bbox = BoundingBox::new(lamin, lomin, lamax, lomax);
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lamin..=self.lamax).contains(&lat) && (self.lomin..=self.lomax).contains(&lon)
    }
}

impl Default for BoundingBox {
    /// Bjärred, Sweden and surroundings.
    fn default() -> Self {
        BJARRED
    }
}

const BJARRED: BoundingBox = BoundingBox::new(54.0, 12.0, 56.0, 14.0);

/// Named regions usable from the CLI.
pub const REGIONS: &[(&str, BoundingBox)] = &[
    ("bjarred", BJARRED),
    (
        "switzerland",
        BoundingBox::new(45.8389, 5.9962, 47.8229, 10.5226),
    ),
    (
        "new-jersey",
        BoundingBox::new(39.065456, -75.448057, 41.386476, -73.657286),
    ),
];

/// Look up a named region. Case-insensitive.
pub fn region(name: &str) -> Option<BoundingBox> {
    REGIONS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, bbox)| *bbox)
}

/// Format the request URL for a bounding box query.
///
/// `extended` asks the feed to include the category column.
pub fn request_url(base_url: &str, bbox: &BoundingBox, extended: bool) -> String {
    let mut url = format!(
        "{base_url}?lamin={:.6}&lomin={:.6}&lamax={:.6}&lomax={:.6}",
        bbox.lamin, bbox.lomin, bbox.lamax, bbox.lomax
    );
    if extended {
        url.push_str("&extended=1");
    }
    url
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
