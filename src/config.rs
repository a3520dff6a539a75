//! Runtime configuration loaded from the environment.
//!
//! Every scheduler tunable in [`crate::constants`] has a same-named
//! environment variable override; unset variables fall back to the
//! compiled-in default.

use std::time::Duration;

use crate::constants;
use crate::error::{RelayError, Result};

/// Selects which credential flow [`crate::auth`] uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// `API_KEY` + `API_SECRET` login handshake.
    Api { api_key: String, api_secret: String },
    /// A pre-issued `ENCTOKEN` paired with `USERID`.
    EncToken { enctoken: String, userid: String },
}

/// Process configuration, assembled once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential flow and its parameters.
    pub auth_method: AuthMethod,
    /// `true` in a production deploy (`FLASK_ENV=production` or equivalent);
    /// selects the egress server's logging/error-detail verbosity.
    pub production: bool,

    /// Maximum instruments subscribed per connection (`N`).
    pub symbols_per_connection: usize,
    /// Maximum number of concurrent upstream connections.
    pub max_connections: u8,
    /// Rotation stride per cycle.
    pub rotation_stride: usize,
    /// Time between rotation cycles.
    pub cycle_interval: Duration,
    /// Minimum gap between an unsubscribe and a following subscribe.
    pub inter_command_gap: Duration,
    /// Maximum reconnection attempts before giving up.
    pub max_retries: u32,
    /// Delay between reconnection attempts.
    pub retry_delay: Duration,
    /// How long a cached instrument catalog remains valid.
    pub catalog_cache_ttl: Duration,

    /// Address the egress HTTP/WebSocket server binds to.
    pub bind_addr: String,
    /// Directory `GET /config.json` is served from.
    pub deploy_dir: String,
}

impl Config {
    /// Load configuration from the process environment, falling back to
    /// the defaults in [`crate::constants`] for anything unset.
    pub fn from_env() -> Result<Self> {
        let auth_method = match env_opt("AUTH_METHOD").as_deref() {
            Some("ENCTOKEN") => AuthMethod::EncToken {
                enctoken: require_env("ENCTOKEN")?,
                userid: require_env("USERID")?,
            },
            Some("API") | None => AuthMethod::Api {
                api_key: require_env("API_KEY")?,
                api_secret: require_env("API_SECRET")?,
            },
            Some(other) => {
                return Err(RelayError::InvalidArgument(format!(
                    "unrecognized AUTH_METHOD: {other}"
                )));
            }
        };

        let production = matches!(
            env_opt("FLASK_ENV").as_deref(),
            Some("production") | Some("prod")
        );

        Ok(Self {
            auth_method,
            production,
            symbols_per_connection: env_usize(
                "SYMBOLS_PER_CONNECTION",
                constants::SYMBOLS_PER_CONNECTION,
            )?,
            max_connections: env_u8("MAX_CONNECTIONS", constants::MAX_CONNECTIONS)?,
            rotation_stride: env_usize("ROTATION_STRIDE", constants::ROTATION_STRIDE)?,
            cycle_interval: env_duration_secs("CYCLE_INTERVAL_SECS", constants::CYCLE_INTERVAL)?,
            inter_command_gap: env_duration_secs(
                "INTER_COMMAND_GAP_SECS",
                constants::INTER_COMMAND_GAP,
            )?,
            max_retries: env_u32("MAX_RETRIES", constants::MAX_RETRIES)?,
            retry_delay: env_duration_secs("RETRY_DELAY_SECS", constants::RETRY_DELAY)?,
            catalog_cache_ttl: env_duration_secs(
                "CATALOG_CACHE_TTL_SECS",
                constants::CATALOG_CACHE_TTL,
            )?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            deploy_dir: std::env::var("DEPLOY_DIR").unwrap_or_else(|_| ".".to_string()),
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| RelayError::InvalidArgument(format!("missing required environment variable: {key}")))
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match env_opt(key) {
        Some(v) => v
            .parse()
            .map_err(|_| RelayError::InvalidArgument(format!("{key} must be an integer"))),
        None => Ok(default),
    }
}

fn env_u8(key: &str, default: u8) -> Result<u8> {
    match env_opt(key) {
        Some(v) => v
            .parse()
            .map_err(|_| RelayError::InvalidArgument(format!("{key} must be an integer"))),
        None => Ok(default),
    }
}

fn env_u32(key: &str, default: u32) -> Result<u32> {
    match env_opt(key) {
        Some(v) => v
            .parse()
            .map_err(|_| RelayError::InvalidArgument(format!("{key} must be an integer"))),
        None => Ok(default),
    }
}

fn env_duration_secs(key: &str, default: Duration) -> Result<Duration> {
    match env_opt(key) {
        Some(v) => {
            let secs: u64 = v
                .parse()
                .map_err(|_| RelayError::InvalidArgument(format!("{key} must be an integer number of seconds")))?;
            Ok(Duration::from_secs(secs))
        }
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_usize_falls_back_to_default_when_unset() {
        assert_eq!(env_usize("TICK_RELAY_TEST_UNSET_VAR", 3_000).unwrap(), 3_000);
    }
}
