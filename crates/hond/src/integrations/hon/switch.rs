//! Switch entities: boolean settings and start/stop style controls.

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
use super::entity::command_name;
use super::entity::remote_control_available;
use super::entity::HonEntity;
use super::helpers::unique_entities;
use crate::appliance::ApplianceError;
use crate::appliance::ApplianceSnapshot;
use crate::engine::Entity;
use crate::engine::Platform;
use crate::engine::SwitchState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchKind {
    /// Backed by a `0`/`1` setting. Writes send the setting's command,
    /// except for config switches which only stage the value.
    Setting,
    /// Two separate commands; state read from `status_key`.
    Control {
        turn_on_key: &'static str,
        turn_off_key: &'static str,
        status_key: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: Option<&'static str>,
    pub translation_key: Option<&'static str>,
    pub entity_category: Option<EntityCategory>,
    pub kind: SwitchKind,
}

impl SwitchDescription {
    pub fn setting(key: &'static str, name: &'static str) -> Self {
        Self {
            key,
            name,
            icon: None,
            translation_key: None,
            entity_category: None,
            kind: SwitchKind::Setting,
        }
    }

    /// A control switch reporting its state under `key`.
    pub fn control(
        key: &'static str,
        name: &'static str,
        turn_on_key: &'static str,
        turn_off_key: &'static str,
    ) -> Self {
        Self {
            kind: SwitchKind::Control {
                turn_on_key,
                turn_off_key,
                status_key: key,
            },
            ..Self::setting(key, name)
        }
    }

    pub fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
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

impl EntityDescription for SwitchDescription {
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

fn pause() -> SwitchDescription {
    SwitchDescription::control("pause", "Pause", "pauseProgram", "resumeProgram")
        .icon("mdi:pause")
        .translation_key("pause")
}

pub static SWITCHES: Lazy<Table<SwitchDescription>> = Lazy::new(|| {
    let mut switches = table([
        (
            "WM",
            vec![
                SwitchDescription::control("active", "Washing Machine", "startProgram", "stopProgram")
                    .icon("mdi:washing-machine")
                    .translation_key("washing_machine"),
                pause(),
                SwitchDescription::setting("startProgram.delayStatus", "Delay Status")
                    .icon("mdi:timer-check")
                    .translation_key("delay_time")
                    .category(EntityCategory::Config),
                SwitchDescription::setting("startProgram.autoDetergentStatus", "Auto Dose Detergent")
                    .icon("mdi:cup")
                    .translation_key("auto_dose_detergent")
                    .category(EntityCategory::Config),
                SwitchDescription::setting("startProgram.autoSoftenerStatus", "Auto Dose Softener")
                    .icon("mdi:cup")
                    .translation_key("auto_dose_softener")
                    .category(EntityCategory::Config),
                SwitchDescription::setting("startProgram.acquaplus", "Acqua Plus")
                    .icon("mdi:water-plus")
                    .translation_key("acqua_plus")
                    .category(EntityCategory::Config),
                SwitchDescription::setting("startProgram.goodNight", "Good Night Mode")
                    .icon("mdi:weather-night")
                    .translation_key("good_night")
                    .category(EntityCategory::Config),
            ],
        ),
        (
            "TD",
            vec![
                SwitchDescription::control("active", "Tumble Dryer", "startProgram", "stopProgram")
                    .icon("mdi:tumble-dryer")
                    .translation_key("tumble_dryer"),
                pause(),
                SwitchDescription::setting("startProgram.sterilizationStatus", "Sterilization")
                    .icon("mdi:clock-start")
                    .translation_key("sterilization")
                    .category(EntityCategory::Config),
                SwitchDescription::setting("startProgram.antiCreaseTime", "Anti-Crease")
                    .icon("mdi:timer")
                    .translation_key("anti_crease")
                    .category(EntityCategory::Config),
            ],
        ),
        (
            "DW",
            vec![
                SwitchDescription::control("active", "Dish Washer", "startProgram", "stopProgram")
                    .icon("mdi:dishwasher")
                    .translation_key("dish_washer"),
                SwitchDescription::setting("startProgram.extraDry", "Extra Dry")
                    .icon("mdi:hair-dryer")
                    .translation_key("extra_dry")
                    .category(EntityCategory::Config),
                SwitchDescription::setting("startProgram.halfLoad", "Half Load")
                    .icon("mdi:fraction-one-half")
                    .translation_key("half_load")
                    .category(EntityCategory::Config),
                SwitchDescription::setting("startProgram.openDoor", "Open Door")
                    .icon("mdi:door-open")
                    .translation_key("open_door")
                    .category(EntityCategory::Config),
                SwitchDescription::setting("startProgram.ecoExpress", "Eco Express")
                    .icon("mdi:leaf")
                    .translation_key("eco_express")
                    .category(EntityCategory::Config),
            ],
        ),
        (
            "AC",
            vec![
                SwitchDescription::setting("settings.10degreeHeatingStatus", "10° Heating")
                    .icon("mdi:heat-wave")
                    .translation_key("10_degree_heating"),
                SwitchDescription::setting("settings.echoStatus", "Echo").icon("mdi:account-voice"),
                SwitchDescription::setting("settings.ecoMode", "Eco Mode").translation_key("eco_mode"),
                SwitchDescription::setting("settings.healthMode", "Health Mode")
                    .icon("mdi:medication-outline"),
                SwitchDescription::setting("settings.muteStatus", "Mute")
                    .icon("mdi:volume-off")
                    .translation_key("mute_mode"),
                SwitchDescription::setting("settings.rapidMode", "Rapid Mode")
                    .icon("mdi:run-fast")
                    .translation_key("rapid_mode"),
                SwitchDescription::setting("settings.screenDisplayStatus", "Screen Display")
                    .icon("mdi:monitor-small"),
                SwitchDescription::setting("settings.silentSleepStatus", "Silent Sleep")
                    .icon("mdi:bed")
                    .translation_key("silent_mode"),
            ],
        ),
        (
            "REF",
            vec![
                SwitchDescription::setting("settings.intelligenceMode", "Auto-Set Mode")
                    .icon("mdi:thermometer-auto")
                    .translation_key("auto_set"),
                SwitchDescription::setting("settings.quickModeZ1", "Super Cool")
                    .icon("mdi:snowflake")
                    .translation_key("super_cool"),
                SwitchDescription::setting("settings.quickModeZ2", "Super Freeze")
                    .icon("mdi:snowflake-variant")
                    .translation_key("super_freeze"),
                SwitchDescription::setting("settings.holidayMode", "Holiday Mode")
                    .icon("mdi:palm-tree")
                    .translation_key("holiday_mode"),
            ],
        ),
    ]);

    let washer_dryer = unique_entities(
        descriptions_for(&switches, "WM"),
        descriptions_for(&switches, "TD"),
    );
    switches.insert("WD", washer_dryer);
    switches
});

/// Appliance values are `0`/`1` as numbers, strings or booleans.
fn is_on(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f == 1.0),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f == 1.0),
        _ => None,
    }
}

pub struct SwitchEntity {
    base: HonEntity,
    description: SwitchDescription,
}

impl SwitchEntity {
    pub fn new(coordinator: Arc<Coordinator>, description: SwitchDescription) -> Self {
        let base = HonEntity::new(
            coordinator,
            Platform::Switch,
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

    pub fn description(&self) -> &SwitchDescription {
        &self.description
    }

    fn supported(&self, snapshot: &ApplianceSnapshot) -> bool {
        match &self.description.kind {
            SwitchKind::Setting => snapshot.has_setting(self.description.key),
            SwitchKind::Control {
                turn_on_key,
                turn_off_key,
                ..
            } => {
                snapshot.commands.contains(*turn_on_key)
                    && snapshot.commands.contains(*turn_off_key)
            }
        }
    }

    pub fn available(&self, update: &CoordinatorUpdate) -> bool {
        if !update.last_update_success {
            return false;
        }
        match self.description.kind {
            SwitchKind::Setting => true,
            SwitchKind::Control { .. } => update
                .snapshot
                .as_deref()
                .is_some_and(remote_control_available),
        }
    }

    pub fn render(&self, update: &CoordinatorUpdate) -> SwitchState {
        let status_key = match &self.description.kind {
            SwitchKind::Setting => self.description.key,
            SwitchKind::Control { status_key, .. } => *status_key,
        };
        let on = update
            .snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.get(status_key))
            .and_then(|value| is_on(&value));

        SwitchState {
            on,
            available: self.available(update),
        }
    }

    pub async fn set(&self, on: bool) -> Result<(), ApplianceError> {
        {
            let mut appliance = self.base.coordinator().lock_appliance().await;
            match &self.description.kind {
                SwitchKind::Setting => {
                    appliance
                        .setting_mut(self.description.key)?
                        .set_value(&Value::from(u8::from(on)))?;
                    // Config switches are parameters of the next program start
                    if self.description.entity_category != Some(EntityCategory::Config) {
                        appliance
                            .send_command(command_name(self.description.key))
                            .await?;
                    }
                }
                SwitchKind::Control {
                    turn_on_key,
                    turn_off_key,
                    ..
                } => {
                    let command = if on { turn_on_key } else { turn_off_key };
                    appliance.send_command(command).await?;
                }
            }
        }

        // Refresh failures reach entities through the coordinator
        let _ = self.base.coordinator().refresh().await;
        Ok(())
    }
}

impl Entity for SwitchEntity {
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
        Platform::Switch
    }
}

/// Switch entities for an appliance whose coordinator has data.
///
/// Setting switches need their setting; control switches need both commands.
pub fn entities_for(coordinator: &Arc<Coordinator>) -> Vec<SwitchEntity> {
    let Some(snapshot) = coordinator.current().snapshot else {
        return Vec::new();
    };

    descriptions_for(&SWITCHES, &snapshot.info.appliance_type)
        .iter()
        .map(|description| SwitchEntity::new(coordinator.clone(), description.clone()))
        .filter(|entity| entity.supported(&snapshot))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::appliance::mock::MockAppliance;
    use crate::appliance::Parameter;
    use crate::integrations::hon::coordinator::UPDATE_INTERVAL;

    fn binary(value: &str) -> Parameter {
        Parameter::Enum {
            values: vec!["0".to_string(), "1".to_string()],
            value: value.to_string(),
        }
    }

    async fn ready(appliance: MockAppliance) -> Arc<Coordinator> {
        let coordinator = Arc::new(Coordinator::new(Box::new(appliance), UPDATE_INTERVAL));
        coordinator.first_refresh().await.unwrap();
        coordinator
    }

    #[test]
    fn test_is_on() {
        assert_eq!(is_on(&json!("1")), Some(true));
        assert_eq!(is_on(&json!(1.0)), Some(true));
        assert_eq!(is_on(&json!(0)), Some(false));
        assert_eq!(is_on(&json!(false)), Some(false));
        assert_eq!(is_on(&json!("on")), None);
    }

    #[test]
    fn test_washer_dryer_keeps_washer_active_switch() {
        let active: Vec<&SwitchDescription> =
            SWITCHES["WD"].iter().filter(|d| d.key == "active").collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Washing Machine");
    }

    #[tokio::test]
    async fn test_setup_requires_setting_or_commands() {
        let mut appliance =
            MockAppliance::new("aa:bb", "WM").with_setting("startProgram.delayStatus", binary("0"));
        appliance.commands.remove("stopProgram");
        let coordinator = ready(appliance).await;

        let ids: Vec<String> = entities_for(&coordinator)
            .iter()
            .map(|e| e.entity_id().to_string())
            .collect();
        assert_eq!(ids, ["switch.my_wm_delay_status"]);
    }

    #[tokio::test]
    async fn test_setting_switch_turn_on() {
        let appliance =
            MockAppliance::new("aa:bb", "AC").with_setting("settings.ecoMode", binary("0"));
        let sent = appliance.sent.clone();
        let coordinator = ready(appliance).await;
        let entity = &entities_for(&coordinator)[0];
        assert_eq!(entity.render(&coordinator.current()).on, Some(false));

        entity.set(true).await.unwrap();

        assert_eq!(*sent.lock().unwrap(), vec!["settings".to_string()]);
        assert_eq!(
            entity.render(&coordinator.current()),
            SwitchState {
                on: Some(true),
                available: true,
            }
        );
    }

    #[tokio::test]
    async fn test_config_switch_only_stages_value() {
        let mut appliance =
            MockAppliance::new("aa:bb", "WM").with_setting("startProgram.delayStatus", binary("0"));
        appliance.commands.remove("stopProgram");
        let sent = appliance.sent.clone();
        let coordinator = ready(appliance).await;
        let entity = &entities_for(&coordinator)[0];
        assert_eq!(
            entity.description().entity_category,
            Some(EntityCategory::Config)
        );

        entity.set(true).await.unwrap();

        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(entity.render(&coordinator.current()).on, Some(true));
        assert_eq!(
            coordinator.lock_appliance().await.settings()["startProgram.delayStatus"].value(),
            json!("1")
        );
    }

    #[tokio::test]
    async fn test_control_switch_commands() {
        let appliance = MockAppliance::new("aa:bb", "WM")
            .with_data(json!({"attributes": {"parameters": {"active": 1}}}));
        let sent = appliance.sent.clone();
        let coordinator = ready(appliance).await;
        let entities = entities_for(&coordinator);
        assert_eq!(entities.len(), 1);
        let entity = &entities[0];
        assert_eq!(entity.entity_id(), "switch.my_wm_washing_machine");
        assert_eq!(entity.render(&coordinator.current()).on, Some(true));

        entity.set(false).await.unwrap();
        entity.set(true).await.unwrap();
        assert_eq!(
            *sent.lock().unwrap(),
            vec!["stopProgram".to_string(), "startProgram".to_string()]
        );
    }

    #[tokio::test]
    async fn test_control_switch_unavailable_when_disconnected() {
        let coordinator = ready(MockAppliance::new("aa:bb", "TD").with_data(json!({
            "attributes": {"lastConnEvent": {"category": "DISCONNECTED"}}
        })))
        .await;
        let entity = &entities_for(&coordinator)[0];
        let state = entity.render(&coordinator.current());
        assert!(!state.available);
        assert_eq!(state.on, None);
    }
}
