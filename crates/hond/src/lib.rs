pub mod api;
pub mod appliance;
pub mod config;
mod engine;
pub mod integrations;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use engine::Device;
pub use engine::Engine;
pub use engine::EngineError;
pub use engine::NumberState;
pub use engine::Platform;
pub use engine::SensorState;
pub use engine::State;
pub use engine::SwitchState;
