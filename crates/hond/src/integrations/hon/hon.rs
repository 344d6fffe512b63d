use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::coordinator::Coordinator;
use super::coordinator::CoordinatorUpdate;
use super::number;
use super::number::NumberEntity;
use super::registry::CoordinatorRegistry;
use super::sensor;
use super::sensor::SensorEntity;
use super::switch;
use super::switch::SwitchEntity;
use super::HonConfig;
use super::DOMAIN;
use crate::appliance::ApplianceError;
use crate::appliance::ApplianceSource;
use crate::engine::Entity;
use crate::engine::FromIntegrationMessage;
use crate::engine::FromIntegrationSender;
use crate::engine::Integration;
use crate::engine::ToIntegrationMessage;

#[derive(Debug, thiserror::Error)]
pub enum HonError {
    #[error("hon integration has no entity {0}")]
    UnknownEntity(String),

    #[error(transparent)]
    Appliance(#[from] ApplianceError),

    #[error("engine is no longer receiving events")]
    EngineGone,
}

fn boxed(e: HonError) -> Box<dyn Error + Send> {
    Box::new(e)
}

/// Entities of one appliance, all fed by the same coordinator.
struct ApplianceEntities {
    numbers: Vec<NumberEntity>,
    sensors: Vec<SensorEntity>,
    switches: Vec<SwitchEntity>,
}

impl ApplianceEntities {
    /// Build the entities of one appliance. Entity ids already in `taken`
    /// get a numeric suffix so that same-named appliances stay apart.
    fn build(coordinator: &Arc<Coordinator>, taken: &mut HashSet<String>) -> Self {
        let mut entities = Self {
            numbers: number::entities_for(coordinator),
            sensors: sensor::entities_for(coordinator),
            switches: switch::entities_for(coordinator),
        };

        let bases = entities
            .numbers
            .iter_mut()
            .map(NumberEntity::base_mut)
            .chain(entities.sensors.iter_mut().map(SensorEntity::base_mut))
            .chain(entities.switches.iter_mut().map(SwitchEntity::base_mut));
        for base in bases {
            base.claim_entity_id(taken);
        }
        entities
    }

    fn len(&self) -> usize {
        self.numbers.len() + self.sensors.len() + self.switches.len()
    }

    fn discoveries(&self) -> Vec<FromIntegrationMessage> {
        let bases = self
            .numbers
            .iter()
            .map(NumberEntity::base)
            .chain(self.sensors.iter().map(SensorEntity::base))
            .chain(self.switches.iter().map(SwitchEntity::base));

        bases
            .map(|base| FromIntegrationMessage::EntityDiscovered {
                entity_id: base.entity_id().to_string(),
                integration_name: DOMAIN.to_string(),
                platform: base.platform(),
                device: base.device_info(),
            })
            .collect()
    }

    fn removals(&self) -> impl Iterator<Item = FromIntegrationMessage> + '_ {
        self.numbers
            .iter()
            .map(NumberEntity::base)
            .chain(self.sensors.iter().map(SensorEntity::base))
            .chain(self.switches.iter().map(SwitchEntity::base))
            .map(|base| FromIntegrationMessage::EntityRemoved {
                entity_id: base.entity_id().to_string(),
            })
    }

    /// Render every entity against one coordinator update.
    fn states(&self, update: &CoordinatorUpdate) -> Vec<FromIntegrationMessage> {
        let numbers = self
            .numbers
            .iter()
            .map(|entity| FromIntegrationMessage::NumberStateChanged {
                entity_id: entity.entity_id().to_string(),
                state: entity.render(update),
            });
        let sensors = self
            .sensors
            .iter()
            .map(|entity| FromIntegrationMessage::SensorStateChanged {
                entity_id: entity.entity_id().to_string(),
                state: entity.render(update),
            });
        let switches = self
            .switches
            .iter()
            .map(|entity| FromIntegrationMessage::SwitchStateChanged {
                entity_id: entity.entity_id().to_string(),
                state: entity.render(update),
            });

        numbers.chain(sensors).chain(switches).collect()
    }
}

/// hOn integration for hond
///
/// Loads appliances from a source, keeps one polling coordinator per
/// appliance and exposes numbers, sensors and switches for each.
pub struct HonIntegration<S: ApplianceSource> {
    source: S,
    config: HonConfig,
    registry: CoordinatorRegistry,
    appliances: Vec<Arc<ApplianceEntities>>,
    /// Entity ids handed out so far
    entity_ids: HashSet<String>,
    /// Tasks forwarding coordinator updates to the engine
    tasks: Vec<JoinHandle<()>>,
    to_engine: Option<FromIntegrationSender>,
}

impl<S: ApplianceSource> HonIntegration<S> {
    pub fn new(source: S, config: &HonConfig) -> Self {
        Self {
            source,
            config: config.clone(),
            registry: CoordinatorRegistry::new(config.update_interval()),
            appliances: Vec::new(),
            entity_ids: HashSet::new(),
            tasks: Vec::new(),
            to_engine: None,
        }
    }

    fn find_number(&self, entity_id: &str) -> Result<&NumberEntity, HonError> {
        self.appliances
            .iter()
            .flat_map(|appliance| appliance.numbers.iter())
            .find(|entity| entity.entity_id() == entity_id)
            .ok_or_else(|| HonError::UnknownEntity(entity_id.to_string()))
    }

    fn find_switch(&self, entity_id: &str) -> Result<&SwitchEntity, HonError> {
        self.appliances
            .iter()
            .flat_map(|appliance| appliance.switches.iter())
            .find(|entity| entity.entity_id() == entity_id)
            .ok_or_else(|| HonError::UnknownEntity(entity_id.to_string()))
    }

    /// Forward every coordinator update to the engine as state changes.
    fn spawn_forwarder(
        coordinator: &Coordinator,
        entities: Arc<ApplianceEntities>,
        tx: FromIntegrationSender,
    ) -> JoinHandle<()> {
        let mut updates = coordinator.subscribe();
        let name = coordinator.name().to_string();

        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let update = updates.borrow_and_update().clone();
                debug!("[{}] Forwarding update to {} entities", name, entities.len());
                for msg in entities.states(&update) {
                    if tx.send(msg).await.is_err() {
                        return;
                    }
                }
            }
        })
    }

    async fn set_number(&self, entity_id: &str, value: f64) -> Result<(), HonError> {
        let entity = self.find_number(entity_id)?;
        info!("Setting {} to {}", entity_id, value);
        entity.set_native_value(value).await?;
        Ok(())
    }

    async fn set_switch(&self, entity_id: &str, on: bool) -> Result<(), HonError> {
        let entity = self.find_switch(entity_id)?;
        info!("Turning {} {}", entity_id, if on { "on" } else { "off" });
        entity.set(on).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: ApplianceSource> Integration for HonIntegration<S> {
    fn name(&self) -> &str {
        DOMAIN
    }

    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), Box<dyn Error + Send>> {
        info!(
            "Loading hOn appliances from {}",
            self.config.fixtures.display()
        );
        let appliances = self
            .source
            .load()
            .await
            .map_err(|e| boxed(HonError::from(e)))?;

        let mut seen = HashSet::new();
        for appliance in appliances {
            let coordinator = self.registry.get_or_create(appliance);
            if !seen.insert(coordinator.name().to_string()) {
                warn!("Appliance {} listed twice, ignoring", coordinator.name());
                continue;
            }

            if let Err(e) = coordinator.first_refresh().await {
                error!("Skipping appliance: {}", e);
                continue;
            }

            let entities = Arc::new(ApplianceEntities::build(
                &coordinator,
                &mut self.entity_ids,
            ));
            info!(
                "Registering {} entities for {} ({})",
                entities.len(),
                coordinator.appliance_info().nick_name,
                coordinator.name()
            );

            let forwarder = Self::spawn_forwarder(&coordinator, entities.clone(), tx.clone());
            let initial = entities
                .discoveries()
                .into_iter()
                .chain(entities.states(&coordinator.current()));
            for msg in initial {
                tx.send(msg).await.map_err(|_| boxed(HonError::EngineGone))?;
            }

            coordinator.start();
            self.tasks.push(forwarder);
            self.appliances.push(entities);
        }

        info!(
            "hOn integration ready with {} appliances",
            self.appliances.len()
        );
        self.to_engine = Some(tx);
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>> {
        match msg {
            ToIntegrationMessage::SetNumber { entity_id, value } => {
                self.set_number(&entity_id, value).await.map_err(boxed)
            }
            ToIntegrationMessage::SetSwitch { entity_id, on } => {
                self.set_switch(&entity_id, on).await.map_err(boxed)
            }
        }
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>> {
        info!("hOn integration shutting down");
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.registry.shutdown();

        let removals: Vec<FromIntegrationMessage> = self
            .appliances
            .drain(..)
            .flat_map(|entities| entities.removals().collect::<Vec<_>>())
            .collect();
        if let Some(tx) = self.to_engine.take() {
            for msg in removals {
                // The engine may already be gone when the daemon exits
                if let Err(e) = tx.try_send(msg) {
                    warn!("Failed to send EntityRemoved message: {}", e);
                }
            }
        }
        self.entity_ids.clear();
        Ok(())
    }
}
