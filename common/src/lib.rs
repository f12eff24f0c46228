//! Shared building blocks for the API gateway.
//!
//! - [`middleware::auth`] - bearer-token authentication gate
//! - [`middleware::request_id`] - request ID propagation
//! - [`auth`] - token validator implementations
//! - [`config`] - environment-driven configuration
//! - [`response`] - error envelope for gateway-generated failures

pub mod auth;
pub mod config;
pub mod middleware;
pub mod response;
