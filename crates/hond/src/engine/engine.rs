use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::integration::FromIntegrationReceiver;
use super::integration::FromIntegrationSender;
use super::integration::Integration;
use super::integration::ToIntegrationSender;
use super::message::FromIntegrationMessage;
use super::message::ToIntegrationMessage;
use super::state::State;
use crate::engine::IntegrationContext;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no integration found for entity: {0}")]
    UnknownEntity(String),

    #[error("integration channel not found: {0}")]
    IntegrationNotFound(String),

    #[error("integration {0} is no longer running")]
    IntegrationStopped(String),
}

/// hond engine
///
/// This structure handles the flow of events, sending commands to the correct
/// integration, and maintaining a view of the world with State.
pub struct Engine {
    /// Centralized state snapshot (readers load the Arc, writer stores a new one)
    state: ArcSwap<State>,

    /// Map of entity_id -> integration name for routing messages
    entity_integration_map: std::sync::Mutex<HashMap<String, String>>,

    /// Communication channels to integrations (for commands)
    integration_channels: std::sync::Mutex<HashMap<String, ToIntegrationSender>>,

    /// Receive messages from integrations (events)
    message_rx: Mutex<FromIntegrationReceiver>,

    /// Sender for integrations to report events back to the engine
    message_tx: FromIntegrationSender,

    /// Handles for integration tasks
    integration_handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

/// Capacity for the integration→engine message channel
/// Provides backpressure when integrations send faster than the engine can process
const FROM_INTEGRATION_CHANNEL_SIZE: usize = 1024;

impl Engine {
    /// Create a new Engine instance
    pub fn new() -> Self {
        let (message_tx, message_rx) = mpsc::channel(FROM_INTEGRATION_CHANNEL_SIZE);
        Self {
            state: ArcSwap::new(Arc::default()),
            entity_integration_map: std::sync::Mutex::new(HashMap::new()),
            integration_channels: std::sync::Mutex::new(HashMap::new()),
            message_rx: Mutex::new(message_rx),
            message_tx,
            integration_handles: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Register integrations from configuration
    ///
    /// Runs every registered integration factory against the config and
    /// registers the ones that are enabled.
    pub fn register_integrations_from_config(&self, cfg: &crate::config::Config) {
        let ctx = IntegrationContext { config: cfg };
        for constr in super::integration::REGISTRY {
            let integration = match constr(&ctx) {
                Ok(Some(i)) => i,
                Err(e) => {
                    error!("failed to setup integration: {:#}", e);
                    continue;
                }
                Ok(None) => continue,
            };
            let name = integration.name().to_string();
            self.register_integration(name, integration);
        }
    }

    /// Register an integration with the engine
    ///
    /// This spawns the integration in a background task, wires up channels,
    /// and starts its setup process.
    pub fn register_integration(&self, name: String, mut integration: Box<dyn Integration>) {
        let (to_integration_tx, mut to_integration_rx) = mpsc::unbounded_channel();
        let from_integration_tx = self.message_tx.clone();

        if let Ok(mut channels) = self.integration_channels.lock() {
            channels.insert(name.clone(), to_integration_tx);
        }

        // Spawn integration task
        let handle = tokio::spawn(async move {
            // Setup integration (gives it the sender for events)
            if let Err(e) = integration.setup(from_integration_tx).await {
                warn!("Integration '{}' setup failed: {}", name, e);
                return;
            }

            // Process commands from engine
            while let Some(msg) = to_integration_rx.recv().await {
                if let Err(e) = integration.handle_message(msg).await {
                    warn!("Integration '{}' failed to handle message: {}", name, e);
                }
            }

            if let Err(e) = integration.shutdown().await {
                warn!("Integration '{}' shutdown failed: {}", name, e);
            }
        });

        if let Ok(mut handles) = self.integration_handles.lock() {
            handles.push(handle);
        }
    }

    /// Send a command to an integration
    ///
    /// Routes the command to the appropriate integration based on entity_id.
    pub fn send_command(&self, msg: ToIntegrationMessage) -> Result<(), EngineError> {
        let entity_id = msg.entity_id().to_string();

        let integration_name = self
            .entity_integration_map
            .lock()
            .ok()
            .and_then(|map| map.get(&entity_id).cloned())
            .ok_or_else(|| EngineError::UnknownEntity(entity_id.clone()))?;

        let channels = self
            .integration_channels
            .lock()
            .map_err(|_| EngineError::IntegrationNotFound(integration_name.clone()))?;
        let tx = channels
            .get(&integration_name)
            .ok_or_else(|| EngineError::IntegrationNotFound(integration_name.clone()))?;

        debug!("Routing {:?} to {}", msg, integration_name);
        tx.send(msg)
            .map_err(|_| EngineError::IntegrationStopped(integration_name.clone()))
    }

    /// Set the value of a number entity
    pub fn set_number(&self, entity_id: String, value: f64) -> Result<(), EngineError> {
        self.send_command(ToIntegrationMessage::SetNumber { entity_id, value })
    }

    /// Turn a switch entity on or off
    pub fn set_switch(&self, entity_id: String, on: bool) -> Result<(), EngineError> {
        self.send_command(ToIntegrationMessage::SetSwitch { entity_id, on })
    }

    /// Run the engine's main event loop
    ///
    /// Processes incoming events from integrations and updates state.
    pub async fn run(&self) {
        info!("Engine starting");

        let mut rx = self.message_rx.lock().await;
        while let Some(msg) = rx.recv().await {
            self.handle_event(msg);
        }

        info!("Engine shutting down");
    }

    /// Stop all integrations.
    ///
    /// Closing the command channels ends each integration's command loop,
    /// which then runs its `shutdown`.
    pub async fn shutdown(&self) {
        if let Ok(mut channels) = self.integration_channels.lock() {
            channels.clear();
        }

        let handles: Vec<JoinHandle<()>> = self
            .integration_handles
            .lock()
            .map(|mut handles| handles.drain(..).collect())
            .unwrap_or_default();

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Integration task failed: {}", e);
            }
        }
    }

    /// Get a snapshot of the current engine state.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn state_snapshot(&self) -> Arc<State> {
        self.state.load_full()
    }

    fn update_state(&self, f: impl FnOnce(&mut State)) {
        let mut state = State::clone(&self.state.load());
        f(&mut state);
        self.state.store(Arc::new(state));
    }

    /// Handle an event from an integration
    pub(crate) fn handle_event(&self, msg: FromIntegrationMessage) {
        match msg {
            FromIntegrationMessage::EntityDiscovered {
                entity_id,
                integration_name,
                platform,
                device,
            } => {
                info!(
                    "Entity discovered: {} ({} from {})",
                    entity_id, platform, integration_name
                );

                // Record which integration owns this entity for command routing.
                if let Ok(mut map) = self.entity_integration_map.lock() {
                    map.insert(entity_id.clone(), integration_name);
                }

                // Entity state is not populated until the first state-change message arrives.
                self.update_state(|state| {
                    let entry = state
                        .devices
                        .entry(device.id.clone())
                        .or_insert_with(|| device.clone());
                    entry.merge(device);
                    entry.add_entity(entity_id);
                });
            }
            FromIntegrationMessage::EntityRemoved { entity_id } => {
                info!("Entity removed: {}", entity_id);

                self.update_state(|state| state.remove_entity(&entity_id));

                if let Ok(mut map) = self.entity_integration_map.lock() {
                    map.remove(&entity_id);
                }
            }
            FromIntegrationMessage::NumberStateChanged { entity_id, state } => {
                debug!("Number state changed: {} -> {:?}", entity_id, state);
                self.update_state(|s| {
                    s.numbers.insert(entity_id, state);
                });
            }
            FromIntegrationMessage::SensorStateChanged { entity_id, state } => {
                debug!("Sensor state changed: {} -> {:?}", entity_id, state);
                self.update_state(|s| {
                    s.sensors.insert(entity_id, state);
                });
            }
            FromIntegrationMessage::SwitchStateChanged { entity_id, state } => {
                debug!("Switch state changed: {} -> {:?}", entity_id, state);
                self.update_state(|s| {
                    s.switches.insert(entity_id, state);
                });
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
