//! Error taxonomy of the daemon.
//!
//! Calendar and bridge errors are soft: they are logged and the loop keeps
//! going. Configuration and credential errors are fatal and stop the process
//! before the polling loop starts.

use thiserror::Error;

/// Failure of the upcoming-events query
#[derive(Debug, Error)]
pub enum CalendarError {
    /// Connection reset or other transport failure, worth one retry
    #[error("Calendar transport error: {0}")]
    Transient(String),

    /// The calendar answered, but not with usable events
    #[error("Calendar query failed: {0}")]
    Query(String),
}

impl CalendarError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CalendarError::Transient(_))
    }
}

impl From<google_calendar3::Error> for CalendarError {
    fn from(err: google_calendar3::Error) -> Self {
        match err {
            google_calendar3::Error::HttpError(e) => CalendarError::Transient(e.to_string()),
            google_calendar3::Error::Io(e) => CalendarError::Transient(e.to_string()),
            other => CalendarError::Query(other.to_string()),
        }
    }
}

/// Failure of a single bridge command
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Bridge request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bridge answered with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Bridge rejected {address}: {description} (type {kind})")]
    Rejected {
        kind: u32,
        address: String,
        description: String,
    },

    #[error("Invalid bridge reply: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected bridge reply: {0}")]
    Unexpected(String),
}

impl From<&shared::api::BridgeFault> for BridgeError {
    fn from(fault: &shared::api::BridgeFault) -> Self {
        BridgeError::Rejected {
            kind: fault.kind,
            address: fault.address.clone(),
            description: fault.description.clone(),
        }
    }
}

/// Missing or inconsistent configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// No usable calendar session
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read OAuth client secret: {0}")]
    Secret(#[source] std::io::Error),

    #[error("Failed to build authenticator: {0}")]
    Authenticator(#[source] std::io::Error),

    #[error("Failed to obtain calendar access token: {0}")]
    Token(#[source] google_calendar3::yup_oauth2::Error),

    #[error("Failed to load native TLS roots: {0}")]
    Tls(#[source] std::io::Error),
}
