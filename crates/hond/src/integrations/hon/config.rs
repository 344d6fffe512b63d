use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

fn default_enabled() -> bool {
    true
}

fn default_update_interval_secs() -> u64 {
    super::coordinator::UPDATE_INTERVAL.as_secs()
}

/// Configuration for the hOn integration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Set to false to keep the section without loading appliances
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Directory of appliance dumps, one JSON file per appliance
    pub fixtures: PathBuf,

    /// Seconds between appliance refreshes (default: 10)
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
}

impl Config {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }
}
