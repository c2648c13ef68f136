// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! It holds the feed endpoints, the property store location and the polling
//! cadence. Panel settings themselves live in the property store.

use std::path::PathBuf;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::persistence::FilePropertyStore;

const APP_NAME: &str = "flypad";
const CONFIG_NAME: &str = "config";
const CONFIG_VERSION: u32 = 1;

/// Default SimBrief flight plan endpoint
pub const DEFAULT_SIMBRIEF_URL: &str = "https://www.simbrief.com/api/xml.fetcher.php";

/// Default METAR endpoint; the ICAO code is appended as a path segment
pub const DEFAULT_METAR_URL: &str = "https://api.flybywiresim.com/metar";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    #[serde(default = "default_simbrief_url")]
    pub simbrief_url: String,

    #[serde(default = "default_metar_url")]
    pub metar_url: String,

    /// Weather network passed to the METAR provider
    #[serde(default = "default_weather_source")]
    pub weather_source: String,

    /// Override for the property store file
    #[serde(default)]
    pub property_store_path: Option<PathBuf>,

    /// Poll interval for simulator-synced settings
    #[serde(default = "default_sync_poll_interval_ms")]
    pub sync_poll_interval_ms: u64,

    /// Dashboard refresh interval, 0 to refresh only at startup
    #[serde(default = "default_dashboard_refresh_secs")]
    pub dashboard_refresh_secs: u64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    CONFIG_VERSION
}

fn default_simbrief_url() -> String {
    DEFAULT_SIMBRIEF_URL.to_string()
}

fn default_metar_url() -> String {
    DEFAULT_METAR_URL.to_string()
}

fn default_weather_source() -> String {
    "vatsim".to_string()
}

fn default_sync_poll_interval_ms() -> u64 {
    500
}

fn default_dashboard_refresh_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            simbrief_url: default_simbrief_url(),
            metar_url: default_metar_url(),
            weather_source: default_weather_source(),
            property_store_path: None,
            sync_poll_interval_ms: default_sync_poll_interval_ms(),
            dashboard_refresh_secs: default_dashboard_refresh_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, writing it back if the schema is older
    pub fn load() -> Result<Self, confy::ConfyError> {
        let mut config: Self = confy::load(APP_NAME, CONFIG_NAME)?;

        if config.config_version < CONFIG_VERSION {
            info!(
                "Upgrading configuration from version {} to {}",
                config.config_version, CONFIG_VERSION
            );
            config.config_version = CONFIG_VERSION;
            config.save()?;
        }

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Property store file: the override, else the platform data directory
    #[must_use]
    pub fn property_store_file(&self) -> Option<PathBuf> {
        self.property_store_path
            .clone()
            .or_else(FilePropertyStore::default_path)
    }

    #[must_use]
    pub const fn sync_poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync_poll_interval_ms)
    }

    #[must_use]
    pub const fn dashboard_refresh_interval(&self) -> Option<Duration> {
        if self.dashboard_refresh_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.dashboard_refresh_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "weather_source": "ivao", "dashboard_refresh_secs": 0 }"#)
                .unwrap();

        assert_eq!(config.weather_source, "ivao");
        assert_eq!(config.simbrief_url, DEFAULT_SIMBRIEF_URL);
        assert_eq!(config.metar_url, DEFAULT_METAR_URL);
        assert_eq!(config.config_version, CONFIG_VERSION);
        assert_eq!(config.sync_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.dashboard_refresh_interval(), None);
    }

    #[test]
    fn test_property_store_override() {
        let config = AppConfig {
            property_store_path: Some(PathBuf::from("/tmp/flypad.json")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.property_store_file(),
            Some(PathBuf::from("/tmp/flypad.json"))
        );
    }
}
