//! Configuration file management for opensky-feed.
//!
//! Reads/writes `~/.opensky-feed/config.yaml` with the feed endpoint, the
//! default query region, and where to keep raw responses.

use std::path::{Path, PathBuf};

use crate::query::{BoundingBox, DEFAULT_BASE_URL};
use crate::types::FeedError;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub feed: FeedConfig,
    pub region: BoundingBox,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Ask the feed for the category column (`extended=1`).
    pub extended: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub raw_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feed: FeedConfig {
                base_url: DEFAULT_BASE_URL.into(),
                timeout_secs: 10,
                extended: true,
            },
            region: BoundingBox::default(),
            output: OutputConfig { raw_path: None },
        }
    }
}

/// Get the config directory path (`~/.opensky-feed/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".opensky-feed")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.opensky-feed/config.yaml`.
///
/// Returns default config if the file doesn't exist or can't be read.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(e) => {
            log::warn!("ignoring unreadable config {}: {e}", path.display());
            Config::default()
        }
    }
}

/// Save config to `~/.opensky-feed/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, FeedError> {
    save_config_to(config, &config_file())
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<PathBuf, FeedError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(path.to_path_buf())
}

/// Parse simple YAML-like config text. Unknown keys and bad values keep defaults.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<&str> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = if val.is_empty() { Some(key) } else { None };
            continue;
        }

        match (current_section, key) {
            (Some("feed"), "base_url") => {
                if let Some(v) = parse_string_value(val) {
                    config.feed.base_url = v;
                }
            }
            (Some("feed"), "timeout_secs") => {
                if let Ok(v) = val.parse() {
                    config.feed.timeout_secs = v;
                }
            }
            (Some("feed"), "extended") => {
                if let Ok(v) = val.parse() {
                    config.feed.extended = v;
                }
            }
            (Some("region"), "lamin") => set_float(&mut config.region.lamin, val),
            (Some("region"), "lomin") => set_float(&mut config.region.lomin, val),
            (Some("region"), "lamax") => set_float(&mut config.region.lamax, val),
            (Some("region"), "lomax") => set_float(&mut config.region.lomax, val),
            (Some("output"), "raw_path") => config.output.raw_path = parse_string_value(val),
            _ => {}
        }
    }

    config
}

fn set_float(slot: &mut f64, val: &str) {
    if let Some(v) = parse_float_value(val) {
        *slot = v;
    }
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# opensky-feed configuration".to_string(), String::new()];

    lines.push("feed:".into());
    lines.push(format!("  base_url: \"{}\"", config.feed.base_url));
    lines.push(format!("  timeout_secs: {}", config.feed.timeout_secs));
    lines.push(format!("  extended: {}", config.feed.extended));
    lines.push(String::new());

    lines.push("region:".into());
    lines.push(format!("  lamin: {}", config.region.lamin));
    lines.push(format!("  lomin: {}", config.region.lomin));
    lines.push(format!("  lamax: {}", config.region.lamax));
    lines.push(format!("  lomax: {}", config.region.lomax));
    lines.push(String::new());

    lines.push("output:".into());
    match &config.output.raw_path {
        Some(path) => lines.push(format!("  raw_path: \"{path}\"")),
        None => lines.push("  raw_path: null".into()),
    }

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.feed.timeout_secs, 10);
        assert!(config.feed.extended);
        assert_eq!(config.region.lamin, 54.0);
        assert!(config.output.raw_path.is_none());
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
feed:
  base_url: "http://localhost:9000/api/states/all"
  timeout_secs: 3
  extended: false

region:
  lamin: 45.8389
  lomin: 5.9962
  lamax: 47.8229
  lomax: 10.5226

output:
  raw_path: "/tmp/flight_radar_data.raw"
"#;
        let config = parse_config(text);
        assert_eq!(config.feed.base_url, "http://localhost:9000/api/states/all");
        assert_eq!(config.feed.timeout_secs, 3);
        assert!(!config.feed.extended);
        assert_eq!(config.region.lamin, 45.8389);
        assert_eq!(config.region.lomax, 10.5226);
        assert_eq!(
            config.output.raw_path.as_deref(),
            Some("/tmp/flight_radar_data.raw")
        );
    }

    #[test]
    fn test_parse_config_null_and_bad_values() {
        let text = r#"
feed:
  timeout_secs: soon

region:
  lamin: ~

output:
  raw_path: null
"#;
        let config = parse_config(text);
        assert_eq!(config.feed.timeout_secs, 10);
        assert_eq!(config.region.lamin, 54.0);
        assert!(config.output.raw_path.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.feed.base_url = "https://example.com/states".into();
        config.region = BoundingBox::new(39.065456, -75.448057, 41.386476, -73.657286);
        config.output.raw_path = Some("capture.raw".into());

        let parsed = parse_config(&serialize_config(&config));
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.feed.timeout_secs = 30;
        let written = save_config_to(&config, &path).unwrap();
        assert_eq!(written, path);

        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_save_into_file_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = save_config_to(&Config::default(), &blocker.join("config.yaml")).unwrap_err();
        assert!(matches!(err, FeedError::Io(_)), "{err:?}");
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.yaml"));
        assert_eq!(config, Config::default());
    }
}
