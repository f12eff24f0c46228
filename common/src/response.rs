//! Error envelope for failures the gateway produces itself.
//!
//! Upstream unreachable, oversized request bodies and the like are reported
//! with [`ApiErrorResponse`]. Authentication failures are not: they have their
//! own fixed body, see [`crate::middleware::auth::AuthErrorBody`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::middleware::request_id::RequestId;

/// Body of a gateway-generated error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Always `false`.
    pub success: bool,
    pub error: ApiError,
    pub meta: ResponseMeta,
}

/// API error details.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Error code for client handling (e.g., "BAD_GATEWAY").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Correlation data attached to every error.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Request ID assigned by the request ID middleware, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Service that produced the error.
    pub service: String,
}

impl ApiErrorResponse {
    pub fn new(
        service: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: ApiError {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta {
                request_id: None,
                timestamp: Utc::now(),
                service: service.into(),
            },
        }
    }

    /// Records the request ID, if the request carried one.
    pub fn with_request_id(mut self, request_id: Option<&RequestId>) -> Self {
        self.meta.request_id = request_id.map(|id| id.as_str().to_string());
        self
    }
}
