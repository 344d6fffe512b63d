//! Type-safe message system for hond
//!
//! Messages are split by direction to enforce correct usage at compile time:
//! - `FromIntegrationMessage`: Events from integrations to the engine
//! - `ToIntegrationMessage`: Commands from the engine to integrations

use super::device::Device;
use super::entity::Platform;
use super::state::NumberState;
use super::state::SensorState;
use super::state::SwitchState;

/// Messages FROM integrations TO the engine (events/state updates)
#[derive(Debug, Clone)]
pub enum FromIntegrationMessage {
    /// An entity was discovered and registered
    EntityDiscovered {
        entity_id: String,
        integration_name: String,
        platform: Platform,
        device: Device,
    },

    /// An entity was removed (appliance unpaired, etc.)
    EntityRemoved { entity_id: String },

    NumberStateChanged {
        entity_id: String,
        state: NumberState,
    },

    SensorStateChanged {
        entity_id: String,
        state: SensorState,
    },

    SwitchStateChanged {
        entity_id: String,
        state: SwitchState,
    },
}

/// Messages FROM the engine TO integrations (commands)
#[derive(Debug, Clone, PartialEq)]
pub enum ToIntegrationMessage {
    /// Set the value of a number entity
    SetNumber { entity_id: String, value: f64 },

    /// Turn a switch entity on or off
    SetSwitch { entity_id: String, on: bool },
}

impl ToIntegrationMessage {
    /// The entity this command targets, used for routing.
    pub fn entity_id(&self) -> &str {
        match self {
            ToIntegrationMessage::SetNumber { entity_id, .. }
            | ToIntegrationMessage::SetSwitch { entity_id, .. } => entity_id,
        }
    }
}
