//! Device/session configuration
//!
//! Values load from an optional TOML file and default to what the Zond-12e
//! family ships with: telnet port, 512 samples, 100 ns range, one 700-trace
//! B-scan batch.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::*;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device hostname or IP
    pub host: String,

    /// Device TCP port
    pub port: u16,

    /// Requested samples per trace (128/256/512/1024; other values fall
    /// back to 512)
    pub sample_quantity: u16,

    /// Requested time range in ns (25/50/100/200/300/2000; other values
    /// fall back to 50)
    pub time_range_ns: u16,

    /// Sliding-window capacity in traces
    pub window_capacity: usize,

    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Per-read deadline in milliseconds; `None` blocks forever
    pub read_timeout_ms: Option<u64>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            sample_quantity: DEFAULT_SAMPLE_QUANTITY,
            time_range_ns: DEFAULT_TIME_RANGE_NS,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: Some(DEFAULT_READ_TIMEOUT_MS),
        }
    }
}

impl DeviceConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&text).map_err(|e| {
            Error::Config(format!("{}: {}", path.as_ref().display(), e))
        })
    }

    /// Reject values no session could run with.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }
        if self.window_capacity == 0 {
            return Err(Error::Config("window capacity must be non-zero".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.port, 23);
        assert_eq!(config.sample_quantity, 512);
        assert_eq!(config.time_range_ns, 100);
        assert_eq!(config.window_capacity, 700);
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_validate_rejects_unusable_values() {
        let mut config = DeviceConfig {
            host: "192.168.0.10".into(),
            ..DeviceConfig::default()
        };
        assert!(config.validate().is_ok());

        config.window_capacity = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.window_capacity = 5;
        config.host.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DeviceConfig =
            toml::from_str("host = \"192.168.0.10\"\ntime_range_ns = 300\n").unwrap();
        assert_eq!(config.host, "192.168.0.10");
        assert_eq!(config.time_range_ns, 300);
        assert_eq!(config.port, 23);
        assert_eq!(config.window_capacity, 700);
    }
}
