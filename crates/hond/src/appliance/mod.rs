//! Appliance object model.
//!
//! Appliances are owned by an external control library. hond only sees them
//! through the [`Appliance`] trait: identity, an attribute tree, settable
//! command parameters, a refresh method and named command senders.

mod fixture;
pub mod parameter;
pub mod value;

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

pub use fixture::FixtureAppliance;
pub use fixture::FixtureSource;
pub use parameter::Parameter;
pub use parameter::ParameterError;
pub use parameter::Settings;
pub use value::AttributeTree;
pub use value::LookupError;

/// Static identity of an appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplianceInfo {
    /// Unique id (the appliance MAC address for hOn devices)
    pub unique_id: String,

    /// Appliance type code, e.g. "WM" for washing machines
    pub appliance_type: String,

    /// User-assigned name
    pub nick_name: String,

    pub model_name: String,

    /// Remaining appliance metadata (`brand`, `fwVersion`, `serialNumber`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplianceError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("appliance {appliance} has no command '{command}'")]
    UnknownCommand { appliance: String, command: String },

    #[error("appliance {appliance} has no setting '{key}'")]
    UnknownSetting { appliance: String, key: String },

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// An appliance as exposed by the external control library.
#[async_trait]
pub trait Appliance: Send + Sync {
    fn info(&self) -> &ApplianceInfo;

    /// Everything the appliance reports: attributes, statistics, appliance metadata
    fn data(&self) -> &AttributeTree;

    fn settings(&self) -> &Settings;

    fn settings_mut(&mut self) -> &mut Settings;

    /// Names of the commands this appliance accepts (`startProgram`, `settings`, ...)
    fn commands(&self) -> &BTreeSet<String>;

    /// Fetch fresh state from the appliance.
    async fn update(&mut self) -> Result<(), ApplianceError>;

    /// Send a named command along with its current parameters.
    async fn send_command(&mut self, command: &str) -> Result<(), ApplianceError>;

    fn unique_id(&self) -> &str {
        &self.info().unique_id
    }

    /// Look up a setting for writing, failing with the appliance's id.
    fn setting_mut(&mut self, key: &str) -> Result<&mut Parameter, ApplianceError> {
        let appliance = self.info().unique_id.clone();
        self.settings_mut()
            .get_mut(key)
            .ok_or_else(|| ApplianceError::UnknownSetting {
                appliance,
                key: key.to_string(),
            })
    }
}

/// Produces the appliances of one account.
#[async_trait]
pub trait ApplianceSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Box<dyn Appliance>>, ApplianceError>;
}

/// Point-in-time copy of an appliance, taken after a successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceSnapshot {
    pub info: ApplianceInfo,
    pub data: AttributeTree,
    pub settings: Settings,
    pub commands: BTreeSet<String>,
}

impl ApplianceSnapshot {
    pub fn capture(appliance: &dyn Appliance) -> Self {
        Self {
            info: appliance.info().clone(),
            data: appliance.data().clone(),
            settings: appliance.settings().clone(),
            commands: appliance.commands().clone(),
        }
    }

    /// Attribute lookup that also sees current command parameter values and
    /// appliance metadata.
    ///
    /// `startProgram.delayTime` is not part of the attribute tree but is a
    /// setting; its current value is returned in that case. Bare keys missing
    /// from the tree fall back to the appliance info (`brand`, `fwVersion`).
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data
            .get(key)
            .cloned()
            .or_else(|| self.settings.get(key).map(Parameter::value))
            .or_else(|| self.info.extra.get(key).cloned())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map(|v| value::render(&v))
            .unwrap_or_else(|| default.to_string())
    }

    pub fn has_setting(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }
}
