//! Authentication gate middleware.
//!
//! Every request that reaches a protected route passes through [`AuthGate`]:
//! the `Authorization` header is classified, a bearer token is handed to the
//! configured [`TokenValidator`], and the request is either forwarded
//! untouched or halted with a `401` JSON body.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::middleware::request_id::RequestId;

/// Scheme prefix a bearer credential must start with. Matched case-sensitively.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Classification of the `Authorization` header of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential<'a> {
    /// Header absent, empty or whitespace-only.
    NoHeader,
    /// Header present but not of the form `Bearer <token>`.
    MalformedHeader,
    /// Everything after the `Bearer ` prefix. May be empty. Bytes that are
    /// not valid UTF-8 are replaced, so the validator still gets a verdict.
    Token(Cow<'a, str>),
}

/// Extract the bearer credential from request headers.
///
/// Only the first `Authorization` header is looked at. The prefix is matched
/// on raw bytes, so opaque (non-ASCII) bytes after `Bearer ` still count as a
/// token and are left for the validator to reject.
pub fn extract_credential(headers: &HeaderMap) -> Credential<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Credential::NoHeader;
    };

    let bytes = value.as_bytes();
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Credential::NoHeader;
    }

    match bytes.strip_prefix(BEARER_PREFIX.as_bytes()) {
        Some(token) => Credential::Token(String::from_utf8_lossy(token)),
        None => Credential::MalformedHeader,
    }
}

/// Capability that decides whether a bearer token is currently valid.
///
/// Implementations must be safe to call concurrently; the gate issues at most
/// one call per request and never caches the outcome.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> bool;
}

/// Reasons the gate refuses a request. All of them map to `401 Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,
    #[error("Invalid Authorization header")]
    MalformedCredential,
    #[error("Invalid or expired JWT token")]
    InvalidCredential,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    /// Wire body written when the gate halts a request.
    pub fn body(&self) -> AuthErrorBody {
        AuthErrorBody {
            error: "unauthorized".to_string(),
            error_description: self.to_string(),
            status: self.status().as_u16(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// JSON body of an authentication failure.
///
/// Field order is part of the wire format:
/// `{"error":"unauthorized","error_description":"...","status":401}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthErrorBody {
    /// Always `unauthorized`.
    pub error: String,
    /// One of the three fixed failure messages.
    pub error_description: String,
    /// HTTP status code, mirrored in the body.
    pub status: u16,
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Forward,
    Halt(AuthError),
}

/// Bearer-token gate placed in front of the proxied routes.
#[derive(Clone)]
pub struct AuthGate {
    validator: Arc<dyn TokenValidator>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }

    /// Decide whether a request with these headers may proceed.
    ///
    /// Checks run in order and stop at the first failure: missing header,
    /// malformed header, then the validator verdict. The validator is only
    /// consulted when a `Bearer ` token was found.
    pub async fn evaluate(&self, headers: &HeaderMap) -> GateDecision {
        match extract_credential(headers) {
            Credential::NoHeader => GateDecision::Halt(AuthError::MissingCredential),
            Credential::MalformedHeader => GateDecision::Halt(AuthError::MalformedCredential),
            Credential::Token(token) => {
                if self.validator.validate(&token).await {
                    GateDecision::Forward
                } else {
                    GateDecision::Halt(AuthError::InvalidCredential)
                }
            }
        }
    }
}

/// Axum adapter for [`AuthGate`].
///
/// On `Forward` the original request is passed to `next` unchanged and its
/// response is returned as-is. On `Halt` the 401 response is returned and
/// `next` never runs.
pub async fn auth_middleware(State(gate): State<AuthGate>, req: Request, next: Next) -> Response {
    // The body is not `Sync`, so only the head is borrowed across the validator await.
    let (parts, body) = req.into_parts();

    match gate.evaluate(&parts.headers).await {
        GateDecision::Forward => {
            tracing::debug!("JWT token validated successfully");
            next.run(Request::from_parts(parts, body)).await
        }
        GateDecision::Halt(err) => {
            let request_id = parts
                .extensions
                .get::<RequestId>()
                .map(RequestId::as_str)
                .unwrap_or("-");
            tracing::warn!(
                request_id,
                method = %parts.method,
                path = %parts.uri.path(),
                reason = %err,
                "request rejected by auth gate"
            );
            err.into_response()
        }
    }
}
