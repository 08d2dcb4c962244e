//! Lighting side of the daemon: the bridge collaborator and the controller
//! that fans commands out over it.

pub mod controller;
pub mod hue;

use async_trait::async_trait;
use shared::api::{GroupAction, LightStateCommand, LightStatus};
use shared::models::LightId;

use crate::error::BridgeError;

pub use controller::LightController;
pub use hue::HueBridge;

/// Per-light and per-group commands against a lighting bridge
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn light_status(&self, light: LightId) -> Result<LightStatus, BridgeError>;

    async fn set_light_state(
        &self,
        light: LightId,
        command: &LightStateCommand,
    ) -> Result<(), BridgeError>;

    async fn set_group_action(&self, group: &str, action: &GroupAction) -> Result<(), BridgeError>;
}
