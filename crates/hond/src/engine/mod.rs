pub mod device;
#[allow(clippy::module_inception)]
mod engine;
pub mod entity;
mod integration;
mod message;
pub mod state;

pub use device::Device;
pub use engine::Engine;
pub use engine::EngineError;
pub use entity::Entity;
pub use entity::Platform;
pub use integration::FromIntegrationSender;
pub use integration::Integration;
pub use integration::IntegrationContext;
pub use integration::IntegrationFactoryResult;
pub use integration::REGISTRY as INTEGRATION_REGISTRY;
pub use message::FromIntegrationMessage;
pub use message::ToIntegrationMessage;
pub use state::NumberState;
pub use state::SensorState;
pub use state::State;
pub use state::SwitchState;
