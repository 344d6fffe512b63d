//! Number entities: writable numeric program parameters and settings.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::coordinator::Coordinator;
use super::coordinator::CoordinatorUpdate;
use super::description::descriptions_for;
use super::description::table;
use super::description::EntityCategory;
use super::description::EntityDescription;
use super::description::Table;
use super::description::Unit;
use super::entity::command_name;
use super::entity::remote_control_available;
use super::entity::HonEntity;
use super::helpers::unique_entities;
use crate::appliance::ApplianceError;
use crate::appliance::Parameter;
use crate::engine::Entity;
use crate::engine::NumberState;
use crate::engine::Platform;

/// How writes reach the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Writing sends the parameter's command right away.
    Control,
    /// Writing only stages the parameter for the next program start.
    Config,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: Option<&'static str>,
    pub unit: Option<Unit>,
    pub translation_key: Option<&'static str>,
    pub entity_category: Option<EntityCategory>,
    pub kind: NumberKind,
}

impl NumberDescription {
    pub fn control(key: &'static str, name: &'static str) -> Self {
        Self {
            key,
            name,
            icon: None,
            unit: None,
            translation_key: None,
            entity_category: None,
            kind: NumberKind::Control,
        }
    }

    pub fn config(key: &'static str, name: &'static str) -> Self {
        Self {
            entity_category: Some(EntityCategory::Config),
            kind: NumberKind::Config,
            ..Self::control(key, name)
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
}

impl EntityDescription for NumberDescription {
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

pub static NUMBERS: Lazy<Table<NumberDescription>> = Lazy::new(|| {
    let mut numbers = table([
        (
            "AP",
            vec![NumberDescription::config("startProgram.machMode", "Wind Speed")
                .icon("mdi:wind-sock")],
        ),
        (
            "WM",
            vec![
                NumberDescription::config("startProgram.delayTime", "Delay Time")
                    .icon("mdi:timer-plus")
                    .unit(Unit::Minutes)
                    .translation_key("delay_time"),
                NumberDescription::config("startProgram.rinseIterations", "Rinse Iterations")
                    .icon("mdi:rotate-right")
                    .translation_key("rinse_iterations"),
                NumberDescription::config("startProgram.mainWashTime", "Main Wash Time")
                    .icon("mdi:clock-start")
                    .unit(Unit::Minutes)
                    .translation_key("wash_time"),
                NumberDescription::config("startProgram.steamLevel", "Steam Level")
                    .icon("mdi:weather-dust")
                    .translation_key("steam_level"),
                NumberDescription::config("startProgram.waterHard", "Water hard")
                    .icon("mdi:water")
                    .translation_key("water_hard"),
                NumberDescription::config("startProgram.lang", "lang"),
            ],
        ),
        (
            "TD",
            vec![
                NumberDescription::config("startProgram.delayTime", "Delay time")
                    .icon("mdi:timer-plus")
                    .unit(Unit::Minutes)
                    .translation_key("delay_time"),
                NumberDescription::config("startProgram.tempLevel", "Temperature level")
                    .icon("mdi:thermometer")
                    .translation_key("tumbledryertemplevel"),
                NumberDescription::config("startProgram.dryTime", "Dry Time")
                    .translation_key("dry_time"),
            ],
        ),
        (
            "OV",
            vec![
                NumberDescription::config("startProgram.delayTime", "Delay time")
                    .icon("mdi:timer-plus")
                    .unit(Unit::Minutes)
                    .translation_key("delay_time"),
                NumberDescription::config("startProgram.tempSel", "Target Temperature")
                    .icon("mdi:thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("target_temperature"),
                NumberDescription::config("startProgram.prTime", "Program Duration")
                    .icon("mdi:timelapse")
                    .unit(Unit::Minutes)
                    .translation_key("program_duration"),
            ],
        ),
        (
            "IH",
            vec![
                NumberDescription::config("startProgram.temp", "Temperature")
                    .icon("mdi:thermometer")
                    .translation_key("temperature"),
                NumberDescription::config("startProgram.powerManagement", "Power Management")
                    .icon("mdi:timelapse")
                    .translation_key("power_management"),
            ],
        ),
        (
            "DW",
            vec![
                NumberDescription::config("startProgram.delayTime", "Delay time")
                    .icon("mdi:timer-plus")
                    .unit(Unit::Minutes)
                    .translation_key("delay_time"),
                NumberDescription::config("startProgram.waterHard", "Water hard")
                    .icon("mdi:water")
                    .translation_key("water_hard"),
            ],
        ),
        (
            "AC",
            vec![NumberDescription::control("settings.tempSel", "Target Temperature")
                .icon("mdi:thermometer")
                .unit(Unit::Celsius)
                .translation_key("target_temperature")],
        ),
        (
            "REF",
            vec![
                NumberDescription::control("settings.tempSelZ1", "Fridge Temperature")
                    .icon("mdi:thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("fridge_temp_sel"),
                NumberDescription::control("settings.tempSelZ2", "Freezer Temperature")
                    .icon("mdi:thermometer")
                    .unit(Unit::Celsius)
                    .translation_key("freezer_temp_sel"),
            ],
        ),
        (
            "HO",
            vec![NumberDescription::control("startProgram.lightStatus", "Light status")
                .icon("mdi:lightbulb")
                .category(EntityCategory::Config)],
        ),
    ]);

    let washer_dryer = unique_entities(
        descriptions_for(&numbers, "WM"),
        descriptions_for(&numbers, "TD"),
    );
    numbers.insert("WD", washer_dryer);
    numbers
});

pub struct NumberEntity {
    base: HonEntity,
    description: NumberDescription,
}

impl NumberEntity {
    pub fn new(coordinator: Arc<Coordinator>, description: NumberDescription) -> Self {
        let base = HonEntity::new(
            coordinator,
            Platform::Number,
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

    pub fn description(&self) -> &NumberDescription {
        &self.description
    }

    /// Control numbers need a healthy coordinator and an appliance that
    /// accepts remote control. Config numbers are always available: they
    /// only stage values locally.
    pub fn available(&self, update: &CoordinatorUpdate) -> bool {
        match self.description.kind {
            NumberKind::Config => true,
            NumberKind::Control => {
                update.last_update_success
                    && update
                        .snapshot
                        .as_deref()
                        .is_some_and(remote_control_available)
            }
        }
    }

    pub fn render(&self, update: &CoordinatorUpdate) -> NumberState {
        let mut state = NumberState {
            unit: self.description.unit.map(|unit| unit.symbol().to_string()),
            available: self.available(update),
            ..NumberState::default()
        };

        let parameter = update
            .snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.settings.get(self.description.key));
        if let Some(parameter) = parameter {
            if let Parameter::Range { min, max, step, .. } = parameter {
                state.min = Some(*min);
                state.max = Some(*max);
                state.step = Some(*step);
            }
            state.value = parameter.as_f64();
        }

        state
    }

    /// Write a new value.
    ///
    /// Only range parameters take the value. Control numbers then send the
    /// command named by the first segment of the key. Either way the
    /// coordinator refreshes afterwards.
    pub async fn set_native_value(&self, value: f64) -> Result<(), ApplianceError> {
        {
            let mut appliance = self.base.coordinator().lock_appliance().await;
            let setting = appliance.setting_mut(self.description.key)?;
            if setting.is_range() {
                setting.set_number(value)?;
            }
            if self.description.kind == NumberKind::Control {
                appliance
                    .send_command(command_name(self.description.key))
                    .await?;
            }
        }

        // Refresh failures reach entities through the coordinator
        let _ = self.base.coordinator().refresh().await;
        Ok(())
    }
}

impl Entity for NumberEntity {
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
        Platform::Number
    }
}

/// Number entities for an appliance whose coordinator has data.
///
/// Descriptions whose key the appliance does not offer as a setting are skipped.
pub fn entities_for(coordinator: &Arc<Coordinator>) -> Vec<NumberEntity> {
    let Some(snapshot) = coordinator.current().snapshot else {
        return Vec::new();
    };

    descriptions_for(&NUMBERS, &snapshot.info.appliance_type)
        .iter()
        .filter(|description| snapshot.has_setting(description.key))
        .map(|description| NumberEntity::new(coordinator.clone(), description.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::appliance::mock::MockAppliance;
    use crate::integrations::hon::coordinator::UPDATE_INTERVAL;

    fn delay_time() -> Parameter {
        Parameter::Range {
            min: 0.0,
            max: 1440.0,
            step: 30.0,
            value: 0.0,
        }
    }

    fn temp_sel() -> Parameter {
        Parameter::Range {
            min: 16.0,
            max: 30.0,
            step: 1.0,
            value: 22.0,
        }
    }

    async fn ready(appliance: MockAppliance) -> Arc<Coordinator> {
        let coordinator = Arc::new(Coordinator::new(Box::new(appliance), UPDATE_INTERVAL));
        coordinator.first_refresh().await.unwrap();
        coordinator
    }

    #[test]
    fn test_washer_dryer_merges_washer_then_dryer() {
        let keys: Vec<&str> = NUMBERS["WD"].iter().map(|d| d.key).collect();
        assert_eq!(
            keys,
            [
                "startProgram.delayTime",
                "startProgram.rinseIterations",
                "startProgram.mainWashTime",
                "startProgram.steamLevel",
                "startProgram.waterHard",
                "startProgram.lang",
                "startProgram.tempLevel",
                "startProgram.dryTime",
            ]
        );
        // The washer's description wins for shared keys
        assert_eq!(NUMBERS["WD"][0].name, "Delay Time");
    }

    #[test]
    fn test_table_kinds() {
        assert!(NUMBERS["WM"].iter().all(|d| d.kind == NumberKind::Config
            && d.entity_category == Some(EntityCategory::Config)));
        let light = &NUMBERS["HO"][0];
        assert_eq!(light.kind, NumberKind::Control);
        assert_eq!(light.entity_category, Some(EntityCategory::Config));
        assert_eq!(NUMBERS["AC"][0].entity_category, None);
    }

    #[tokio::test]
    async fn test_setup_skips_unavailable_settings() {
        let coordinator =
            ready(MockAppliance::new("aa:bb", "WM").with_setting("startProgram.delayTime", delay_time()))
                .await;
        let entities = entities_for(&coordinator);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_id(), "number.my_wm_delay_time");
        assert_eq!(entities[0].unique_id(), "aa:bbstartProgram.delayTime");
    }

    #[tokio::test]
    async fn test_setup_unknown_type() {
        let coordinator = ready(
            MockAppliance::new("aa:bb", "XX").with_setting("startProgram.delayTime", delay_time()),
        )
        .await;
        assert!(entities_for(&coordinator).is_empty());
    }

    #[tokio::test]
    async fn test_render_range() {
        let coordinator = ready(MockAppliance::new("aa:bb", "AC").with_setting("settings.tempSel", temp_sel())).await;
        let entity = &entities_for(&coordinator)[0];

        let state = entity.render(&coordinator.current());
        assert_eq!(
            state,
            NumberState {
                value: Some(22.0),
                min: Some(16.0),
                max: Some(30.0),
                step: Some(1.0),
                unit: Some("°C".to_string()),
                available: true,
            }
        );
    }

    #[tokio::test]
    async fn test_control_availability() {
        let coordinator = ready(
            MockAppliance::new("aa:bb", "AC")
                .with_setting("settings.tempSel", temp_sel())
                .with_data(json!({"attributes": {
                    "parameters": {"remoteCtrValid": "1"},
                    "lastConnEvent": {"category": "DISCONNECTED"}
                }})),
        )
        .await;
        let entity = &entities_for(&coordinator)[0];
        assert!(!entity.available(&coordinator.current()));

        let mut update = coordinator.current();
        update.snapshot = Some(Arc::new(crate::appliance::ApplianceSnapshot::capture(
            &MockAppliance::new("aa:bb", "AC"),
        )));
        assert!(entity.available(&update));

        update.last_update_success = false;
        assert!(!entity.available(&update));
    }

    #[tokio::test]
    async fn test_config_always_available() {
        let coordinator = ready(
            MockAppliance::new("aa:bb", "WM")
                .with_setting("startProgram.delayTime", delay_time())
                .with_data(json!({"attributes": {"parameters": {"remoteCtrValid": "0"}}})),
        )
        .await;
        let entity = &entities_for(&coordinator)[0];

        let mut update = coordinator.current();
        assert!(entity.available(&update));
        update.last_update_success = false;
        assert!(entity.available(&update));
    }

    #[tokio::test]
    async fn test_control_set_sends_command_and_refreshes() {
        let appliance =
            MockAppliance::new("aa:bb", "AC").with_setting("settings.tempSel", temp_sel());
        let sent = appliance.sent.clone();
        let calls = appliance.update_calls.clone();
        let coordinator = ready(appliance).await;
        let entity = &entities_for(&coordinator)[0];

        entity.set_native_value(25.0).await.unwrap();

        assert_eq!(*sent.lock().unwrap(), vec!["settings".to_string()]);
        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(entity.render(&coordinator.current()).value, Some(25.0));
    }

    #[tokio::test]
    async fn test_config_set_only_stages_value() {
        let appliance =
            MockAppliance::new("aa:bb", "WM").with_setting("startProgram.delayTime", delay_time());
        let sent = appliance.sent.clone();
        let coordinator = ready(appliance).await;
        let entity = &entities_for(&coordinator)[0];

        entity.set_native_value(120.0).await.unwrap();

        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(entity.render(&coordinator.current()).value, Some(120.0));
    }

    #[tokio::test]
    async fn test_set_out_of_range() {
        let coordinator =
            ready(MockAppliance::new("aa:bb", "AC").with_setting("settings.tempSel", temp_sel())).await;
        let entity = &entities_for(&coordinator)[0];

        let err = entity.set_native_value(40.0).await.unwrap_err();
        assert!(matches!(err, ApplianceError::Parameter(_)));
        assert_eq!(entity.render(&coordinator.current()).value, Some(22.0));
    }
}
