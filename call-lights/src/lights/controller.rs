//! Drives the configured lights into a mode.
//!
//! All commands are fire-and-forget: a failing light is logged and the
//! fan-out continues with the next one.

use shared::api::{GroupAction, LightStateCommand};
use shared::models::{LightId, Mode};

use super::Bridge;
use crate::config::{AmbientStyle, LightSettings};

/// Size of the bridge's hue wheel
pub const MAX_HUE: u32 = 65535;

const FULL_SATURATION: u8 = 254;
const FULL_BRIGHTNESS: u8 = 254;
const MEETING_EFFECT: &str = "colorloop";

pub struct LightController<B> {
    bridge: B,
    settings: LightSettings,
    /// Hue given to the first light on the next multicolor activation
    hue_cursor: u32,
}

impl<B: Bridge> LightController<B> {
    pub fn new(bridge: B, settings: LightSettings) -> Self {
        Self {
            bridge,
            settings,
            hue_cursor: 0,
        }
    }

    pub fn hue_cursor(&self) -> u32 {
        self.hue_cursor
    }

    /// Make sure every light is on without toggling the ones already lit
    pub async fn turn_on(&self) {
        for &light in &self.settings.lights {
            match self.bridge.light_status(light).await {
                Ok(status) if status.on && status.reachable => {
                    tracing::debug!("Light {} already on", light);
                    continue;
                }
                Ok(status) => {
                    tracing::debug!("Light {} reports {:?}", light, status);
                }
                Err(e) => {
                    tracing::debug!("Light {} status unknown: {}", light, e);
                }
            }

            tracing::info!("Turning light {} on", light);
            self.send(light, &LightStateCommand::power(true)).await;
        }
    }

    pub async fn turn_off(&self) {
        for &light in &self.settings.lights {
            self.send(light, &LightStateCommand::power(false)).await;
        }
    }

    pub async fn activate(&mut self, mode: Mode) {
        match (mode, &self.settings.ambient) {
            (Mode::ActiveCall, _) => {
                let action = GroupAction::scene(self.settings.meeting_scene_id.clone())
                    .with_effect(MEETING_EFFECT);
                self.send_group(&action).await;
            }
            (Mode::Ambient, AmbientStyle::Multicolor) => self.rotate_palette().await,
            (Mode::Ambient, AmbientStyle::WarmTones { scene_id }) => {
                let action = GroupAction::scene(scene_id.clone());
                self.send_group(&action).await;
            }
        }
    }

    /// Distance between neighbouring lights on the hue wheel.
    ///
    /// A single light still gets half a turn so the palette keeps moving.
    fn hue_spread(&self) -> u32 {
        let count = u32::try_from(self.settings.lights.len()).unwrap_or(u32::MAX);
        MAX_HUE / count.max(2)
    }

    async fn rotate_palette(&mut self) {
        let spread = self.hue_spread();
        let mut hue = self.hue_cursor;

        for &light in &self.settings.lights {
            tracing::debug!("Light {} hue={}", light, hue);
            let command = LightStateCommand::color(
                hue as u16,
                FULL_SATURATION,
                FULL_BRIGHTNESS,
                self.settings.transition_time,
            );
            self.send(light, &command).await;
            hue = (hue + spread) % MAX_HUE;
        }

        self.hue_cursor = (self.hue_cursor + spread) % MAX_HUE;
        tracing::debug!("Next palette starts at hue={}", self.hue_cursor());
    }

    async fn send(&self, light: LightId, command: &LightStateCommand) {
        if let Err(e) = self.bridge.set_light_state(light, command).await {
            tracing::warn!("Command to light {} failed: {}", light, e);
        }
    }

    async fn send_group(&self, action: &GroupAction) {
        if let Err(e) = self
            .bridge
            .set_group_action(&self.settings.group, action)
            .await
        {
            tracing::warn!("Command to group {} failed: {}", self.settings.group, e);
        }
    }
}
