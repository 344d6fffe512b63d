use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::info;

use super::coordinator::Coordinator;
use crate::appliance::Appliance;

/// Registry for storing and managing the lifetime of appliance coordinators.
///
/// Created when the integration is set up, filled as appliances are seen and
/// emptied on shutdown. Holds at most one coordinator per appliance unique id.
pub struct CoordinatorRegistry {
    coordinators: BTreeMap<String, Arc<Coordinator>>,
    update_interval: Duration,
}

impl CoordinatorRegistry {
    pub fn new(update_interval: Duration) -> Self {
        Self {
            coordinators: BTreeMap::new(),
            update_interval,
        }
    }

    /// Return the coordinator for this appliance, creating it on first use.
    ///
    /// When a coordinator already exists for the appliance's unique id, the
    /// passed appliance is dropped and the existing coordinator is returned.
    pub fn get_or_create(&mut self, appliance: Box<dyn Appliance>) -> Arc<Coordinator> {
        let unique_id = appliance.unique_id().to_string();
        if let Some(existing) = self.coordinators.get(&unique_id) {
            debug!("Reusing coordinator for {}", unique_id);
            return existing.clone();
        }

        info!("Creating coordinator for {}", unique_id);
        let coordinator = Arc::new(Coordinator::new(appliance, self.update_interval));
        self.coordinators.insert(unique_id, coordinator.clone());
        coordinator
    }

    pub fn get(&self, unique_id: &str) -> Option<Arc<Coordinator>> {
        self.coordinators.get(unique_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinators.is_empty()
    }

    /// Stop every coordinator and forget them.
    pub fn shutdown(&mut self) {
        for (unique_id, coordinator) in std::mem::take(&mut self.coordinators) {
            debug!("Stopping coordinator for {}", unique_id);
            coordinator.stop();
        }
    }
}

impl Drop for CoordinatorRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}
