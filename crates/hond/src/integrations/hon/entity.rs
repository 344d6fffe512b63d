//! Base for all hOn entities.

use std::collections::HashSet;
use std::sync::Arc;

use super::coordinator::Coordinator;
use super::DOMAIN;
use crate::appliance::ApplianceSnapshot;
use crate::engine::Device;
use crate::engine::Platform;

/// Binds one appliance coordinator and, optionally, one description.
pub struct HonEntity {
    unique_id: String,
    entity_id: String,
    name: String,
    platform: Platform,
    coordinator: Arc<Coordinator>,
}

impl HonEntity {
    /// `description` is `(key, name)` of the entity description, if any.
    pub fn new(
        coordinator: Arc<Coordinator>,
        platform: Platform,
        description: Option<(&str, &str)>,
    ) -> Self {
        let info = coordinator.appliance_info();
        let (unique_id, name) = match description {
            Some((key, name)) => (format!("{}{}", info.unique_id, key), name.to_string()),
            None => (info.unique_id.clone(), info.nick_name.clone()),
        };
        let entity_id = match description {
            Some(_) => format!("{}.{}_{}", platform, slugify(&info.nick_name), slugify(&name)),
            None => format!("{}.{}", platform, slugify(&info.nick_name)),
        };

        Self {
            unique_id,
            entity_id,
            name,
            platform,
            coordinator,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Reserve this entity's id among `taken`, appending `_2`, `_3`, ...
    /// while it collides with an id handed out earlier.
    pub fn claim_entity_id(&mut self, taken: &mut HashSet<String>) {
        let mut suffix = 2;
        let mut candidate = self.entity_id.clone();
        while taken.contains(&candidate) {
            candidate = format!("{}_{}", self.entity_id, suffix);
            suffix += 1;
        }
        self.entity_id = candidate;
        taken.insert(self.entity_id.clone());
    }

    /// Host device record for the appliance behind this entity.
    pub fn device_info(&self) -> Device {
        let info = self.coordinator.appliance_info();
        let update = self.coordinator.current();
        let attribute = |key: &str| {
            update
                .snapshot
                .as_ref()
                .map(|snapshot| snapshot.get_or(key, ""))
                .unwrap_or_default()
        };

        let mut device = Device::new(info.unique_id.clone(), info.nick_name.clone());
        device.identifiers = vec![(DOMAIN.to_string(), info.unique_id.clone())];
        device.manufacturer = Some(attribute("brand"));
        device.model = Some(info.model_name.clone());
        device.sw_version = Some(attribute("fwVersion"));
        device
    }
}

/// Whether the appliance currently accepts remote commands.
///
/// Appliances report `remoteCtrValid` (missing means allowed) and the
/// category of their last connection event.
pub fn remote_control_available(snapshot: &ApplianceSnapshot) -> bool {
    snapshot.get_or("remoteCtrValid", "1") == "1"
        && snapshot
            .get("attributes.lastConnEvent.category")
            .is_none_or(|category| category != "DISCONNECTED")
}

/// Command that carries a parameter: `startProgram.delayTime` -> `startProgram`.
pub fn command_name(key: &str) -> &str {
    key.split_once('.').map_or(key, |(command, _)| command)
}

/// Lowercase, alphanumeric runs joined by `_`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::appliance::mock::MockAppliance;
    use crate::integrations::hon::coordinator::UPDATE_INTERVAL;

    fn coordinator(data: serde_json::Value) -> Arc<Coordinator> {
        let appliance = MockAppliance::new("aa:bb:cc", "WM").with_data(data);
        Arc::new(Coordinator::new(Box::new(appliance), UPDATE_INTERVAL))
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Delay Time"), "delay_time");
        assert_eq!(slugify("  My WM!  "), "my_wm");
        assert_eq!(slugify("10° Heating"), "10_heating");
        assert_eq!(slugify("lang"), "lang");
    }

    #[test]
    fn test_command_name() {
        assert_eq!(command_name("startProgram.delayTime"), "startProgram");
        assert_eq!(command_name("settings"), "settings");
    }

    #[test]
    fn test_ids_with_description() {
        let entity = HonEntity::new(
            coordinator(json!({})),
            Platform::Number,
            Some(("startProgram.delayTime", "Delay Time")),
        );
        assert_eq!(entity.unique_id(), "aa:bb:ccstartProgram.delayTime");
        assert_eq!(entity.entity_id(), "number.my_wm_delay_time");
        assert_eq!(entity.name(), "Delay Time");
    }

    #[test]
    fn test_ids_without_description() {
        let entity = HonEntity::new(coordinator(json!({})), Platform::Sensor, None);
        assert_eq!(entity.unique_id(), "aa:bb:cc");
        assert_eq!(entity.entity_id(), "sensor.my_wm");
    }

    #[tokio::test]
    async fn test_device_info() {
        let coordinator = coordinator(json!({
            "attributes": { "parameters": { "brand": "haier", "fwVersion": "1.2.3" } }
        }));
        coordinator.first_refresh().await.unwrap();
        let entity = HonEntity::new(coordinator, Platform::Sensor, None);

        let device = entity.device_info();
        assert_eq!(device.identifiers, vec![("hon".to_string(), "aa:bb:cc".to_string())]);
        assert_eq!(device.manufacturer.as_deref(), Some("haier"));
        assert_eq!(device.name, "My WM");
        assert_eq!(device.model.as_deref(), Some("Model X"));
        assert_eq!(device.sw_version.as_deref(), Some("1.2.3"));
    }

    #[tokio::test]
    async fn test_device_info_from_appliance_info() {
        let appliance = MockAppliance::new("aa:bb:cc", "WM")
            .with_info("brand", json!("haier"))
            .with_info("fwVersion", json!("1.2"));
        let coordinator = Arc::new(Coordinator::new(Box::new(appliance), UPDATE_INTERVAL));
        coordinator.first_refresh().await.unwrap();

        let device = HonEntity::new(coordinator, Platform::Sensor, None).device_info();
        assert_eq!(device.manufacturer.as_deref(), Some("haier"));
        assert_eq!(device.sw_version.as_deref(), Some("1.2"));
    }

    #[test]
    fn test_claim_entity_id_suffixes_collisions() {
        let mut taken = HashSet::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut entity = HonEntity::new(
                coordinator(json!({})),
                Platform::Number,
                Some(("startProgram.delayTime", "Delay Time")),
            );
            entity.claim_entity_id(&mut taken);
            ids.push(entity.entity_id().to_string());
        }
        assert_eq!(
            ids,
            [
                "number.my_wm_delay_time",
                "number.my_wm_delay_time_2",
                "number.my_wm_delay_time_3",
            ]
        );
    }

    #[tokio::test]
    async fn test_device_info_defaults_before_refresh() {
        let entity = HonEntity::new(coordinator(json!({})), Platform::Sensor, None);
        let device = entity.device_info();
        assert_eq!(device.manufacturer.as_deref(), Some(""));
        assert_eq!(device.sw_version.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_remote_control_available() {
        let snapshot = |data| {
            ApplianceSnapshot::capture(&MockAppliance::new("aa:bb:cc", "WM").with_data(data))
        };

        assert!(remote_control_available(&snapshot(json!({}))));
        assert!(remote_control_available(&snapshot(json!({
            "attributes": { "parameters": { "remoteCtrValid": 1 } }
        }))));
        assert!(!remote_control_available(&snapshot(json!({
            "attributes": { "parameters": { "remoteCtrValid": "0" } }
        }))));
        assert!(!remote_control_available(&snapshot(json!({
            "attributes": { "lastConnEvent": { "category": "DISCONNECTED" } }
        }))));
    }
}
