use std::env;

use thiserror::Error;

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Pre-shared client-authentication header for the OAuth token endpoint.
    pub client_credential: String,
    pub session_ttl_secs: i64,
    pub request_timeout_secs: u64,
    pub bind_addr: String,
    pub bind_port: u16,
    pub accept_invalid_certs: bool,
    /// `startDate` stamped on every paycode-event schedule entry.
    pub event_start_date: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORTAL_CLIENT_CREDENTIAL is not set")]
    MissingCredential,

    #[error("{var} is not a valid value: {value}")]
    Invalid { var: &'static str, value: String },
}

fn parsed<T: std::str::FromStr>(var: &'static str, fallback: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(fallback),
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_credential = env::var("PORTAL_CLIENT_CREDENTIAL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        Ok(Self {
            client_credential,
            session_ttl_secs: parsed("PORTAL_SESSION_TTL_SECS", 3600)?,
            request_timeout_secs: parsed("PORTAL_REQUEST_TIMEOUT_SECS", 20)?,
            bind_addr: env::var("PORTAL_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            bind_port: parsed("PORTAL_BIND_PORT", 8080)?,
            accept_invalid_certs: parsed("PORTAL_ACCEPT_INVALID_CERTS", false)?,
            event_start_date: env::var("PORTAL_EVENT_START_DATE")
                .unwrap_or_else(|_| "2026-01-01".to_string()),
        })
    }
}
