//! Gateway configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file). Every struct also has a `from_vars` constructor so tests can build
//! configuration without touching the real environment.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LEEWAY_SECONDS: u64 = 60;
const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8081";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Snapshot of the process environment, after applying `.env` if present.
pub fn env_vars() -> HashMap<String, String> {
    dotenvy::dotenv().ok();
    std::env::vars().collect()
}

fn parse_or<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Server settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn load_with_service(service_name: &str) -> Result<Self, ConfigError> {
        Self::from_vars(service_name, &env_vars())
    }

    pub fn from_vars(
        service_name: &str,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let host = vars
            .get("SERVER_HOST")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(vars, "SERVER_PORT", DEFAULT_PORT)?;
        let timeout_secs = parse_or(
            vars,
            "REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"));
        }

        Ok(Self {
            service_name: service_name.to_string(),
            host,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Token validation settings.
///
/// The secret is required: without it the gateway cannot build a validator and
/// refuses to start rather than serve unauthenticated traffic.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub leeway_seconds: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl AuthConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(&env_vars())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_secret = vars
            .get("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let leeway_seconds = parse_or(vars, "JWT_LEEWAY_SECONDS", DEFAULT_LEEWAY_SECONDS)?;

        Ok(Self {
            jwt_secret,
            leeway_seconds,
        })
    }
}

/// Where authenticated traffic is forwarded to.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    pub upstream: String,
}

impl ServiceUrls {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(&env_vars())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let upstream = vars
            .get("UPSTREAM_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());

        if !(upstream.starts_with("http://") || upstream.starts_with("https://")) {
            return Err(ConfigError::Invalid("UPSTREAM_URL"));
        }

        Ok(Self { upstream })
    }
}
