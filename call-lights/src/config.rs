use chrono::TimeDelta;
use config::{Config, Environment, File};
use serde::Deserialize;
use shared::models::LightId;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable naming the config file (without extension)
const CONFIG_PATH_VAR: &str = "CALL_LIGHTS_CONFIG";
const DEFAULT_CONFIG_STEM: &str = "config";
const ENV_PREFIX: &str = "CALL_LIGHTS";
/// Upper bound for the poll interval and the lead time
const MAX_SCHEDULE_SECS: u64 = 86_400;

/// Immutable daemon configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub bridge: BridgeSettings,
    pub lights: LightSettings,
    pub calendar: CalendarSettings,
    pub schedule: ScheduleSettings,
    /// Per-cycle diagnostic logging
    pub logging: bool,
}

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub address: String,
    pub username: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmbientStyle {
    /// Per-light hues spread around the color wheel
    Multicolor,
    /// Group-wide warm tones scene
    WarmTones { scene_id: String },
}

#[derive(Debug, Clone)]
pub struct LightSettings {
    pub lights: Vec<LightId>,
    pub group: String,
    pub meeting_scene_id: String,
    pub ambient: AmbientStyle,
    /// Ambient fade in deciseconds
    pub transition_time: u16,
}

#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub calendar_id: String,
    pub credentials_path: PathBuf,
    pub token_cache_path: PathBuf,
    pub max_results: u32,
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub poll_interval: Duration,
    pub lead_time: TimeDelta,
    pub retry_backoff: Duration,
}

/// Keys as they appear in the config file / environment
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(alias = "BRIDGE_IP")]
    bridge_ip: Option<String>,
    #[serde(alias = "BRIDGE_USERNAME")]
    bridge_username: Option<String>,
    #[serde(alias = "LIGHTS", default)]
    lights: Vec<LightId>,
    #[serde(alias = "GROUP")]
    group: Option<String>,
    #[serde(alias = "MEETING_SCENE_ID")]
    meeting_scene_id: Option<String>,
    #[serde(alias = "WARM_TONES_SCENE_ID")]
    warm_tones_scene_id: Option<String>,
    #[serde(alias = "MULTICOLOR", default = "default_true")]
    multicolor: bool,
    #[serde(alias = "LOGGING", default = "default_true")]
    logging: bool,
    #[serde(alias = "POLL_INTERVAL_SECS", default = "default_poll_interval")]
    poll_interval_secs: u64,
    #[serde(alias = "LEAD_TIME_SECS", default = "default_lead_time")]
    lead_time_secs: u64,
    #[serde(alias = "RETRY_BACKOFF_SECS", default = "default_retry_backoff")]
    retry_backoff_secs: u64,
    #[serde(alias = "MAX_RESULTS", default = "default_max_results")]
    max_results: u32,
    #[serde(alias = "CALENDAR_ID", default = "default_calendar_id")]
    calendar_id: String,
    #[serde(alias = "CREDENTIALS_PATH", default = "default_credentials_path")]
    credentials_path: PathBuf,
    #[serde(alias = "TOKEN_CACHE_PATH", default = "default_token_cache_path")]
    token_cache_path: PathBuf,
    #[serde(alias = "TRANSITION_TIME", default = "default_transition_time")]
    transition_time: u16,
    #[serde(alias = "REQUEST_TIMEOUT_SECS", default = "default_request_timeout")]
    request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    240 // 4 minutes
}

fn default_lead_time() -> u64 {
    300 // 5 minutes
}

fn default_retry_backoff() -> u64 {
    60
}

fn default_max_results() -> u32 {
    10
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_cache_path() -> PathBuf {
    PathBuf::from("token_cache.json")
}

fn default_transition_time() -> u16 {
    100 // 10 seconds
}

fn default_request_timeout() -> u64 {
    10
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

/// `EnvFilter` directive used when `RUST_LOG` is unset
pub fn default_log_filter(logging: bool) -> &'static str {
    if logging {
        "call_lights=debug"
    } else {
        "call_lights=warn"
    }
}

impl Settings {
    /// Load from the discovered config file, overridden by `CALL_LIGHTS_*`
    /// environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let stem =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_STEM.to_string());

        let config = Config::builder()
            .add_source(File::with_name(&stem).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("lights"),
            )
            .build()?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let raw: RawSettings = config.try_deserialize()?;
        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let address = required(raw.bridge_ip, "BRIDGE_IP")?;
        let username = required(raw.bridge_username, "BRIDGE_USERNAME")?;

        if raw.lights.is_empty() {
            return Err(ConfigError::Missing("LIGHTS"));
        }

        let group = required(raw.group, "GROUP")?;
        let meeting_scene_id = required(raw.meeting_scene_id, "MEETING_SCENE_ID")?;

        let ambient = if raw.multicolor {
            AmbientStyle::Multicolor
        } else {
            AmbientStyle::WarmTones {
                scene_id: required(raw.warm_tones_scene_id, "WARM_TONES_SCENE_ID")?,
            }
        };

        for (key, secs) in [
            ("POLL_INTERVAL_SECS", raw.poll_interval_secs),
            ("LEAD_TIME_SECS", raw.lead_time_secs),
        ] {
            if secs > MAX_SCHEDULE_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{} ({}) must not exceed {} seconds",
                    key, secs, MAX_SCHEDULE_SECS
                )));
            }
        }

        if raw.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        // A shorter lead time would let an event slip between two polls
        if raw.lead_time_secs < raw.poll_interval_secs {
            return Err(ConfigError::Invalid(format!(
                "LEAD_TIME_SECS ({}) must be at least POLL_INTERVAL_SECS ({})",
                raw.lead_time_secs, raw.poll_interval_secs
            )));
        }

        let lead_time = i64::try_from(raw.lead_time_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "LEAD_TIME_SECS ({}) is out of range",
                    raw.lead_time_secs
                ))
            })?;

        if raw.max_results == 0 {
            return Err(ConfigError::Invalid(
                "MAX_RESULTS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bridge: BridgeSettings {
                address,
                username,
                request_timeout: Duration::from_secs(raw.request_timeout_secs),
            },
            lights: LightSettings {
                lights: raw.lights,
                group,
                meeting_scene_id,
                ambient,
                transition_time: raw.transition_time,
            },
            calendar: CalendarSettings {
                calendar_id: raw.calendar_id,
                credentials_path: raw.credentials_path,
                token_cache_path: raw.token_cache_path,
                max_results: raw.max_results,
            },
            schedule: ScheduleSettings {
                poll_interval: Duration::from_secs(raw.poll_interval_secs),
                lead_time,
                retry_backoff: Duration::from_secs(raw.retry_backoff_secs),
            },
            logging: raw.logging,
        })
    }
}
