use std::error::Error;

use async_trait::async_trait;
use linkme::distributed_slice;
use tokio::sync::mpsc;

use super::message::FromIntegrationMessage;
use super::message::ToIntegrationMessage;
use crate::config::Config;

/// Events from integrations share one bounded channel into the engine
pub type FromIntegrationSender = mpsc::Sender<FromIntegrationMessage>;
pub type FromIntegrationReceiver = mpsc::Receiver<FromIntegrationMessage>;

/// Commands are unbounded so routing from API handlers never waits
pub type ToIntegrationSender = mpsc::UnboundedSender<ToIntegrationMessage>;

/// `Ok(None)` means the integration is not configured or disabled
pub type IntegrationFactoryResult = anyhow::Result<Option<Box<dyn Integration>>>;

/// What an integration factory gets to look at.
pub struct IntegrationContext<'a> {
    pub config: &'a Config,
}

/// Integration factories, one per native integration module
#[distributed_slice]
pub static REGISTRY: [fn(&IntegrationContext) -> IntegrationFactoryResult];

/// A source of devices and entities driven by the engine.
///
/// Each integration runs in its own task: `setup` once, then
/// `handle_message` for every routed command until the engine closes the
/// command channel, then `shutdown`.
#[async_trait]
pub trait Integration: Send + Sync {
    /// Name used for routing and logs, e.g. "hon"
    fn name(&self) -> &str;

    /// Load devices, announce their entities through `tx` and start any
    /// background polling. State changes keep flowing through `tx` afterwards.
    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), Box<dyn Error + Send>>;

    /// Apply a command addressed to one of this integration's entities
    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>>;

    /// Stop background work and withdraw entities
    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>>;
}
