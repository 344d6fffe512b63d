//! Read-only sensor entities.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use super::coordinator::Coordinator;
use super::coordinator::CoordinatorUpdate;
use super::description::descriptions_for;
use super::description::table;
use super::description::EntityCategory;
use super::description::EntityDescription;
use super::description::Table;
use super::description::Unit;
use super::entity::HonEntity;
use super::helpers::readable;
use super::helpers::unique_entities;
use super::labels;
use super::labels::Labels;
use crate::engine::Entity;
use crate::engine::Platform;
use crate::engine::SensorState;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: Option<&'static str>,
    pub unit: Option<Unit>,
    pub translation_key: Option<&'static str>,
    pub entity_category: Option<EntityCategory>,
    /// Labels for enumerated integer values
    pub option_list: Option<&'static Labels>,
}

impl SensorDescription {
    pub fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            key,
            name,
            icon: None,
            unit: None,
            translation_key: None,
            entity_category: None,
            option_list: None,
        }
    }

    pub fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn translation_key(mut self, translation_key: &'static str) -> Self {
        self.translation_key = Some(translation_key);
        self
    }

    pub fn category(mut self, category: EntityCategory) -> Self {
        self.entity_category = Some(category);
        self
    }

    pub fn options(mut self, labels: &'static Labels) -> Self {
        self.option_list = Some(labels);
        self
    }
}

impl EntityDescription for SensorDescription {
    fn key(&self) -> &str {
        self.key
    }

    fn name(&self) -> &str {
        self.name
    }

    fn icon(&self) -> Option<&str> {
        self.icon
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        self.entity_category
    }
}

fn remaining_time() -> SensorDescription {
    SensorDescription::new("remainingTimeMM", "Remaining Time")
        .icon("mdi:timer")
        .unit(Unit::Minutes)
        .translation_key("remaining_time")
}

fn machine_status() -> SensorDescription {
    SensorDescription::new("machMode", "Machine Status")
        .icon("mdi:information")
        .translation_key("mode")
        .options(&labels::MACH_MODE)
}

fn errors() -> SensorDescription {
    SensorDescription::new("errors", "Error")
        .icon("mdi:alert-circle")
        .translation_key("errors")
        .category(EntityCategory::Diagnostic)
}

fn start_time() -> SensorDescription {
    SensorDescription::new("delayTime", "Start Time")
        .icon("mdi:clock-start")
        .unit(Unit::Minutes)
        .translation_key("delay_time")
}

pub static SENSORS: Lazy<Table<SensorDescription>> = Lazy::new(|| {
    let mut sensors = table([
        (
            "WM",
            vec![
                SensorDescription::new("prPhase", "Program Phase")
                    .icon("mdi:washing-machine")
                    .translation_key("program_phases_wm")
                    .options(&labels::WASHING_PR_PHASE),
                SensorDescription::new("totalElectricityUsed", "Total Power")
                    .icon("mdi:connection")
                    .unit(Unit::KilowattHours)
                    .translation_key("energy_total"),
                SensorDescription::new("totalWaterUsed", "Total Water")
                    .icon("mdi:water")
                    .unit(Unit::Liters)
                    .translation_key("water_total"),
                SensorDescription::new("totalWashCycle", "Total Wash Cycle")
                    .icon("mdi:counter")
                    .translation_key("cycles_total"),
                SensorDescription::new("currentElectricityUsed", "Current Electricity Used")
                    .icon("mdi:lightning-bolt")
                    .unit(Unit::KilowattHours)
                    .translation_key("energy_current"),
                SensorDescription::new("currentWaterUsed", "Current Water Used")
                    .icon("mdi:water")
                    .unit(Unit::Liters)
                    .translation_key("water_current"),
                SensorDescription::new("startProgram.weight", "Suggested weight")
                    .icon("mdi:weight-kilogram")
                    .unit(Unit::Kilograms)
                    .translation_key("suggested_load")
                    .category(EntityCategory::Config),
                machine_status(),
                errors(),
                remaining_time(),
                SensorDescription::new("spinSpeed", "Spin Speed")
                    .icon("mdi:speedometer")
                    .translation_key("spin_speed"),
                SensorDescription::new("startProgram.energyLabel", "Energy Label")
                    .icon("mdi:lightning-bolt-circle")
                    .translation_key("energy_label")
                    .category(EntityCategory::Config),
                SensorDescription::new("dirtyLevel", "Dirt level")
                    .icon("mdi:liquid-spot")
                    .translation_key("dirt_level")
                    .options(&labels::DIRTY_LEVEL),
            ],
        ),
        (
            "TD",
            vec![
                machine_status(),
                errors(),
                remaining_time(),
                start_time(),
                SensorDescription::new("prPhase", "Program Phase")
                    .icon("mdi:tumble-dryer")
                    .translation_key("program_phases_td")
                    .options(&labels::TUMBLE_DRYER_PR_PHASE),
                SensorDescription::new("dryLevel", "Dry level")
                    .icon("mdi:hair-dryer")
                    .translation_key("dry_levels")
                    .options(&labels::TUMBLE_DRYER_DRY_LEVEL),
                SensorDescription::new("tempLevel", "Temperature level")
                    .icon("mdi:thermometer")
                    .translation_key("tumbledryertemplevel"),
            ],
        ),
        (
            "OV",
            vec![
                remaining_time(),
                start_time(),
                SensorDescription::new("temp", "Temperature")
                    .icon("mdi:thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("temperature"),
                SensorDescription::new("tempSel", "Temperature Selected")
                    .icon("mdi:thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("target_temperature"),
            ],
        ),
        (
            "DW",
            vec![
                SensorDescription::new("prPhase", "Program Phase")
                    .icon("mdi:dishwasher")
                    .translation_key("program_phases_dw")
                    .options(&labels::DISHWASHER_PR_PHASE),
                SensorDescription::new("totalElectricityUsed", "Total Power")
                    .icon("mdi:connection")
                    .unit(Unit::KilowattHours)
                    .translation_key("energy_total"),
                SensorDescription::new("totalWaterUsed", "Total Water")
                    .icon("mdi:water")
                    .unit(Unit::Liters)
                    .translation_key("water_total"),
                SensorDescription::new("totalWashCycle", "Total Wash Cycle")
                    .icon("mdi:counter")
                    .translation_key("cycles_total"),
                machine_status(),
                errors(),
                remaining_time(),
            ],
        ),
        (
            "AC",
            vec![
                SensorDescription::new("tempAirOutdoor", "Outdoor Temperature")
                    .icon("mdi:thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("air_temperature_outdoor"),
                SensorDescription::new("tempIndoor", "Indoor Temperature")
                    .icon("mdi:thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("temperature_indoor"),
                errors(),
            ],
        ),
        (
            "REF",
            vec![
                SensorDescription::new("humidityEnv", "Room Humidity")
                    .icon("mdi:water-percent")
                    .unit(Unit::Percent)
                    .translation_key("humidity"),
                SensorDescription::new("tempEnv", "Room Temperature")
                    .icon("mdi:home-thermometer-outline")
                    .unit(Unit::Celsius)
                    .translation_key("room_temperature"),
                SensorDescription::new("tempZ1", "Temperature Fridge")
                    .icon("mdi:thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("fridge_temp"),
                SensorDescription::new("tempZ2", "Temperature Freezer")
                    .icon("mdi:snowflake-thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("freezer_temp"),
                errors(),
            ],
        ),
    ]);

    let washer_dryer = unique_entities(
        descriptions_for(&sensors, "WM"),
        descriptions_for(&sensors, "TD"),
    );
    sensors.insert("WD", washer_dryer);
    sensors
});

pub struct SensorEntity {
    base: HonEntity,
    description: SensorDescription,
}

impl SensorEntity {
    pub fn new(coordinator: Arc<Coordinator>, description: SensorDescription) -> Self {
        let base = HonEntity::new(
            coordinator,
            Platform::Sensor,
            Some((description.key, description.name)),
        );
        Self { base, description }
    }

    pub fn base(&self) -> &HonEntity {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut HonEntity {
        &mut self.base
    }

    pub fn description(&self) -> &SensorDescription {
        &self.description
    }

    pub fn render(&self, update: &CoordinatorUpdate) -> SensorState {
        let raw = update
            .snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.get(self.description.key))
            .unwrap_or(Value::Null);

        SensorState {
            value: readable(self.description.option_list, &raw),
            unit: self.description.unit.map(|unit| unit.symbol().to_string()),
            available: update.last_update_success,
        }
    }
}

impl Entity for SensorEntity {
    fn entity_id(&self) -> &str {
        self.base.entity_id()
    }

    fn unique_id(&self) -> &str {
        self.base.unique_id()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn platform(&self) -> Platform {
        Platform::Sensor
    }
}

/// Sensor entities for an appliance whose coordinator has data.
///
/// Descriptions are skipped when the appliance reports no value for the key.
pub fn entities_for(coordinator: &Arc<Coordinator>) -> Vec<SensorEntity> {
    let Some(snapshot) = coordinator.current().snapshot else {
        return Vec::new();
    };

    descriptions_for(&SENSORS, &snapshot.info.appliance_type)
        .iter()
        .filter(|description| snapshot.get(description.key).is_some())
        .map(|description| SensorEntity::new(coordinator.clone(), description.clone()))
        .collect()
}
