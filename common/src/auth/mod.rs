//! Token validators that can back the authentication gate.
//!
//! The gate only depends on the [`TokenValidator`](crate::middleware::auth::TokenValidator)
//! trait; this module provides the HMAC-signed JWT implementation used by the
//! gateway binary.

pub mod jwt;

pub use jwt::{Claims, JwtTokenValidator};
