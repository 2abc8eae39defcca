use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".rapid7_config.json";
pub const VALID_REGIONS: &[&str] = &["us", "eu", "ca", "ap", "au"];
pub const VALID_OUTPUTS: &[&str] = &["table", "json"];
const MIN_QUERY_TIMEOUT_SECS: u64 = 30;

/// User settings persisted as JSON; keys missing from the file take their
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub region: String,
    pub default_output: String,
    pub max_result_pages: u32,
    pub query_timeout: u64,
    pub cache_enabled: bool,
    pub cache_ttl: u64,
    pub max_chars: usize,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "us".to_string(),
            default_output: "table".to_string(),
            max_result_pages: 3,
            query_timeout: 300,
            cache_enabled: true,
            cache_ttl: 3600,
            max_chars: 500,
            verbose: false,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
    }

    /// A missing or empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to load config from {}: {}", path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to load config from {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            Error::Config(format!("Failed to save config to {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !VALID_REGIONS.contains(&self.region.as_str()) {
            return Err(Error::Config(format!(
                "Invalid region: {}. Must be one of {}",
                self.region,
                VALID_REGIONS.join(", ")
            )));
        }
        if !VALID_OUTPUTS.contains(&self.default_output.as_str()) {
            return Err(Error::Config(format!(
                "Invalid output format: {}. Must be one of {}",
                self.default_output,
                VALID_OUTPUTS.join(", ")
            )));
        }
        if self.max_result_pages < 1 {
            return Err(Error::Config(
                "max_result_pages must be a positive integer".to_string(),
            ));
        }
        if self.query_timeout < MIN_QUERY_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "query_timeout must be at least {} seconds",
                MIN_QUERY_TIMEOUT_SECS
            )));
        }
        Ok(())
    }

    /// Applies one `key = value` change; the config is left untouched when
    /// the result would not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "region" => updated.region = value.trim().to_lowercase(),
            "default_output" => updated.default_output = value.trim().to_lowercase(),
            "max_result_pages" => updated.max_result_pages = parse_value(key, value)?,
            "query_timeout" => updated.query_timeout = parse_value(key, value)?,
            "cache_enabled" => updated.cache_enabled = parse_bool(key, value)?,
            "cache_ttl" => updated.cache_ttl = parse_value(key, value)?,
            "max_chars" => updated.max_chars = parse_value(key, value)?,
            "verbose" => updated.verbose = parse_bool(key, value)?,
            _ => {
                return Err(Error::Config(format!("Unknown configuration key: {}", key)));
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate_region(region: &str) -> Result<String> {
        let region = region.trim().to_lowercase();
        if VALID_REGIONS.contains(&region.as_str()) {
            Ok(region)
        } else {
            Err(Error::Config(format!(
                "Invalid region: {}. Must be one of {}",
                region,
                VALID_REGIONS.join(", ")
            )))
        }
    }

    pub fn max_result_pages(&self) -> NonZeroU32 {
        NonZeroU32::new(self.max_result_pages).unwrap_or(NonZeroU32::MIN)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn prefers_json(&self) -> bool {
        self.default_output == "json"
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Error::Config(format!("Invalid value for {}: {}", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_result_pages().get(), 3);
    }

    #[test]
    fn test_partial_file_is_merged_over_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"region": "eu", "cache_ttl": 60, "unknown": 1}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.region, "eu");
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.query_timeout, 300);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set("default_output", "JSON").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert!(loaded.prefers_json());
    }

    #[test]
    fn test_set_rejects_invalid_values_without_changing_config() {
        let mut config = Config::default();
        assert!(config.set("region", "mars").is_err());
        assert!(config.set("max_result_pages", "0").is_err());
        assert!(config.set("query_timeout", "10").is_err());
        assert!(config.set("cache_enabled", "maybe").is_err());
        assert!(config.set("default_output", "simple").is_err());
        assert!(config.set("colour", "red").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_parses_typed_values() {
        let mut config = Config::default();
        config.set("max_result_pages", "7").unwrap();
        config.set("cache_enabled", "off").unwrap();
        config.set("region", " AU ").unwrap();

        assert_eq!(config.max_result_pages, 7);
        assert!(!config.cache_enabled);
        assert_eq!(config.region, "au");
    }

    #[test]
    fn test_region_override_validation() {
        assert_eq!(Config::validate_region("EU").unwrap(), "eu");
        assert!(Config::validate_region("moon").is_err());
    }
}
