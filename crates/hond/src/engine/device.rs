use serde::Serialize;

/// A device in the hond system.
///
/// A device represents a physical appliance that contains one or more entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
    pub entity_ids: Vec<String>,
}

impl Device {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            identifiers: Vec::new(),
            name,
            manufacturer: None,
            model: None,
            sw_version: None,
            entity_ids: Vec::new(),
        }
    }

    pub fn add_entity(&mut self, entity_id: String) {
        if !self.entity_ids.contains(&entity_id) {
            self.entity_ids.push(entity_id);
        }
    }

    /// Fold a newer description of the same device into this one, keeping
    /// the entities already attached.
    pub fn merge(&mut self, other: Device) {
        let entity_ids = std::mem::take(&mut self.entity_ids);
        *self = other;
        for entity_id in entity_ids {
            self.add_entity(entity_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_entity_dedups() {
        let mut device = Device::new("aa:bb".to_string(), "Washer".to_string());
        device.add_entity("number.washer_delay_time".to_string());
        device.add_entity("number.washer_delay_time".to_string());
        assert_eq!(device.entity_ids.len(), 1);
    }

    #[test]
    fn test_merge_keeps_entities() {
        let mut device = Device::new("aa:bb".to_string(), "Washer".to_string());
        device.add_entity("sensor.washer_machine_status".to_string());

        let mut newer = Device::new("aa:bb".to_string(), "Washer".to_string());
        newer.sw_version = Some("2.1".to_string());
        newer.add_entity("number.washer_delay_time".to_string());
        device.merge(newer);

        assert_eq!(device.sw_version.as_deref(), Some("2.1"));
        assert_eq!(
            device.entity_ids,
            vec![
                "number.washer_delay_time".to_string(),
                "sensor.washer_machine_status".to_string()
            ]
        );
    }
}
