use serde::{Deserialize, Serialize};

// ============================================================================
// Light State Types
// ============================================================================

/// Body of `PUT /lights/{id}/state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightStateCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,

    /// Fade duration in deciseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u16>,
}

impl LightStateCommand {
    pub fn power(on: bool) -> Self {
        Self {
            on: Some(on),
            ..Default::default()
        }
    }

    pub fn color(hue: u16, sat: u8, bri: u8, transitiontime: u16) -> Self {
        Self {
            hue: Some(hue),
            sat: Some(sat),
            bri: Some(bri),
            transitiontime: Some(transitiontime),
            ..Default::default()
        }
    }
}

/// Subset of the `GET /lights/{id}` resource
#[derive(Debug, Clone, Deserialize)]
pub struct LightResource {
    #[serde(default)]
    pub name: Option<String>,
    pub state: LightStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LightStatus {
    pub on: bool,

    /// Older bridges omit this for lights they consider reachable
    #[serde(default = "default_reachable")]
    pub reachable: bool,
}

fn default_reachable() -> bool {
    true
}

// ============================================================================
// Group Action Types
// ============================================================================

/// Body of `PUT /groups/{id}/action`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u16>,
}

impl GroupAction {
    /// Recall a scene with no fade
    pub fn scene(scene_id: impl Into<String>) -> Self {
        Self {
            scene: Some(scene_id.into()),
            effect: None,
            transitiontime: Some(0),
        }
    }

    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = Some(effect.into());
        self
    }
}

// ============================================================================
// Bridge Reply Types
// ============================================================================

/// One entry of the array a bridge answers writes (and failed reads) with
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BridgeReply {
    Success { success: serde_json::Value },
    Error { error: BridgeFault },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BridgeFault {
    #[serde(rename = "type")]
    pub kind: u32,
    #[serde(default)]
    pub address: String,
    pub description: String,
}

/// First error entry of a reply, if any
pub fn first_fault(replies: &[BridgeReply]) -> Option<&BridgeFault> {
    replies.iter().find_map(|reply| match reply {
        BridgeReply::Error { error } => Some(error),
        BridgeReply::Success { .. } => None,
    })
}
