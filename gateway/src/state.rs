//! Application state for gateway service.

use std::time::Duration;

use common::config::{AppConfig, ServiceUrls};
use common::middleware::AuthGate;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub service_urls: ServiceUrls,
    pub http_client: reqwest::Client,
    pub auth_gate: AuthGate,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// The gate is passed in rather than built here so callers decide which
    /// token validator backs it.
    pub fn new(
        config: AppConfig,
        service_urls: ServiceUrls,
        auth_gate: AuthGate,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            service_urls,
            http_client,
            auth_gate,
        })
    }
}
