//! Philips Hue bridge client (v1 REST API).

use async_trait::async_trait;
use serde::Serialize;
use shared::api::{first_fault, BridgeReply, GroupAction, LightResource, LightStateCommand, LightStatus};
use shared::models::LightId;

use super::Bridge;
use crate::config::BridgeSettings;
use crate::error::BridgeError;

pub struct HueBridge {
    client: reqwest::Client,
    base_url: String,
}

impl HueBridge {
    pub fn new(settings: &BridgeSettings) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url(&settings.address, &settings.username),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), BridgeError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status));
        }

        let bytes = response.bytes().await?;
        check_write_reply(&bytes)
    }
}

fn base_url(address: &str, username: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        format!("{}/api/{}", address, username)
    } else {
        format!("http://{}/api/{}", address, username)
    }
}

/// Writes are answered with an array of success/error entries
pub(crate) fn check_write_reply(body: &[u8]) -> Result<(), BridgeError> {
    let replies: Vec<BridgeReply> = serde_json::from_slice(body)?;
    match first_fault(&replies) {
        Some(fault) => Err(fault.into()),
        None => Ok(()),
    }
}

/// A light read answers with the resource, or with an error array
pub(crate) fn decode_light_status(body: &[u8]) -> Result<LightStatus, BridgeError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;

    if value.is_array() {
        let replies: Vec<BridgeReply> = serde_json::from_value(value)?;
        return match first_fault(&replies) {
            Some(fault) => Err(fault.into()),
            None => Err(BridgeError::Unexpected(
                "light query answered with a write reply".to_string(),
            )),
        };
    }

    let resource: LightResource = serde_json::from_value(value)?;
    Ok(resource.state)
}

#[async_trait]
impl Bridge for HueBridge {
    async fn light_status(&self, light: LightId) -> Result<LightStatus, BridgeError> {
        let response = self
            .client
            .get(self.url(&format!("lights/{}", light)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status));
        }

        decode_light_status(&response.bytes().await?)
    }

    async fn set_light_state(
        &self,
        light: LightId,
        command: &LightStateCommand,
    ) -> Result<(), BridgeError> {
        self.put(&format!("lights/{}/state", light), command).await
    }

    async fn set_group_action(&self, group: &str, action: &GroupAction) -> Result<(), BridgeError> {
        self.put(&format!("groups/{}/action", group), action).await
    }
}
