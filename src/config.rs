//! Service configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 1800;
pub const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigEnvError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("STUDIO_BACKEND_URL must not be empty")]
    EmptyBackendUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// How long an untouched session lives, and how often that is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExpiry {
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl SessionExpiry {
    #[must_use]
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    pub backend_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub timeouts: BackendTimeouts,
    pub sessions: SessionExpiry,
}

impl StudioConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `STUDIO_BACKEND_URL`: default `http://127.0.0.1:5000`
    /// - `STUDIO_BIND_ADDR`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `STUDIO_BACKEND_REQUEST_TIMEOUT_SECS`: default 30
    /// - `STUDIO_BACKEND_CONNECT_TIMEOUT_SECS`: default 10
    /// - `STUDIO_SESSION_IDLE_TTL_SECS`: default 1800
    /// - `STUDIO_SESSION_SWEEP_INTERVAL_SECS`: default 60
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a valid port number or the backend
    /// URL is blank.
    pub fn from_env() -> Result<Self, ConfigEnvError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// Same as [`StudioConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigEnvError> {
        let backend_url = lookup("STUDIO_BACKEND_URL")
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if backend_url.is_empty() {
            return Err(ConfigEnvError::EmptyBackendUrl);
        }

        let bind_addr = lookup("STUDIO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigEnvError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };
        let timeouts = BackendTimeouts {
            request_secs: parse_u64(&lookup, "STUDIO_BACKEND_REQUEST_TIMEOUT_SECS", DEFAULT_BACKEND_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(&lookup, "STUDIO_BACKEND_CONNECT_TIMEOUT_SECS", DEFAULT_BACKEND_CONNECT_TIMEOUT_SECS),
        };

        // Both clamp to at least one second.
        let sessions = SessionExpiry {
            idle_ttl_secs: parse_u64(&lookup, "STUDIO_SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL_SECS).max(1),
            sweep_interval_secs: parse_u64(&lookup, "STUDIO_SESSION_SWEEP_INTERVAL_SECS", DEFAULT_SESSION_SWEEP_INTERVAL_SECS)
                .max(1),
        };

        Ok(Self { backend_url, bind_addr, port, timeouts, sessions })
    }

    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
