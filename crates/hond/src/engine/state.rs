use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use super::device::Device;

/// State of a number entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberState {
    pub value: Option<f64>,

    /// Bounds and step, when the underlying parameter is a range.
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,

    /// Unit of measurement symbol, e.g. "min" or "°C".
    pub unit: Option<String>,

    pub available: bool,
}

/// State of a sensor entity.
///
/// The value is whatever the appliance reported, after label resolution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorState {
    pub value: serde_json::Value,
    pub unit: Option<String>,
    pub available: bool,
}

/// State of a switch entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SwitchState {
    /// `None` when the appliance does not report the backing value.
    pub on: Option<bool>,
    pub available: bool,
}

/// Centralized snapshot of the entire engine state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub numbers: HashMap<String, NumberState>,
    pub sensors: HashMap<String, SensorState>,
    pub switches: HashMap<String, SwitchState>,
    pub devices: BTreeMap<String, Device>,
}

impl State {
    /// Drop an entity from every platform map and from its device.
    pub fn remove_entity(&mut self, entity_id: &str) {
        self.numbers.remove(entity_id);
        self.sensors.remove(entity_id);
        self.switches.remove(entity_id);
        for device in self.devices.values_mut() {
            device.entity_ids.retain(|id| id != entity_id);
        }
    }
}
