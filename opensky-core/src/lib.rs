//! opensky-core: Pure decode library for the OpenSky state-vector feed.
//!
//! No async, no network — just parsing and schema mapping. The document text
//! is fetched elsewhere (see `opensky-fetch`) and handed in as a `&str`:
//!
//! ```
//! let text = r#"{"time":1700000000,"states":[["4b1815","SWR736  ","Switzerland",
//!     1700000000,1700000003,8.54,47.45,1120.1,false,118.3,254.3,-4.2,null,
//!     1097.2,"1000",false,0,4]]}"#;
//! let out = opensky_core::decode_str(text).unwrap();
//! assert_eq!(out.snapshot.vectors[0].icao24, "4b1815");
//! assert!(out.rejected.is_empty());
//! ```

pub mod config;
pub mod json;
pub mod query;
pub mod state;
pub mod types;

// Re-export commonly used types at crate root
pub use json::{parse, Value};
pub use query::{request_url, BoundingBox};
pub use state::{decode, decode_str};
pub use types::*;
