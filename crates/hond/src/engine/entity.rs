//! Entity abstraction for hond
//!
//! All entities (numbers, sensors, switches) implement the Entity trait.

use serde::Serialize;
use strum::AsRefStr;
use strum::Display;
use strum::EnumString;

/// Host platform an entity belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Number,
    Sensor,
    Switch,
}

/// Base trait that all entities must implement
pub trait Entity: Send + Sync {
    /// Host-visible id, e.g. "number.washer_delay_time"
    fn entity_id(&self) -> &str;

    /// Stable id that survives renames
    fn unique_id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;

    fn platform(&self) -> Platform;
}
