//! Haier hOn appliances.

mod config;
pub mod coordinator;
pub mod description;
pub mod entity;
pub mod helpers;
#[allow(clippy::module_inception)]
mod hon;
pub mod labels;
pub mod number;
pub mod registry;
pub mod sensor;
pub mod switch;

use anyhow::ensure;
use linkme::distributed_slice;

pub use config::Config as HonConfig;
pub use coordinator::Coordinator;
pub use coordinator::HonInfo;
pub use hon::HonError;
pub use hon::HonIntegration;
pub use number::NUMBERS;
pub use registry::CoordinatorRegistry;
pub use sensor::SENSORS;
pub use switch::SWITCHES;

use crate::appliance::FixtureSource;
use crate::engine;

/// Identifier used for devices and integration routing.
pub const DOMAIN: &str = "hon";

#[distributed_slice(engine::INTEGRATION_REGISTRY)]
fn init_hon(ctx: &engine::IntegrationContext) -> engine::IntegrationFactoryResult {
    let Some(hon_config) = &ctx.config.integrations.hon else {
        return Ok(None);
    };
    if !hon_config.enabled {
        return Ok(None);
    }

    ensure!(
        hon_config.fixtures.is_dir(),
        "hOn fixtures directory {} does not exist",
        hon_config.fixtures.display()
    );
    let source = FixtureSource::new(hon_config.fixtures.clone());
    Ok(Some(Box::new(HonIntegration::new(source, hon_config))))
}
