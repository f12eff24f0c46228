//! Errors raised by the gateway while forwarding a request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::middleware::RequestId;
use common::response::ApiErrorResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream service unavailable")]
    UpstreamUnavailable(#[source] reqwest::Error),
    #[error("request body too large")]
    BodyTooLarge,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            GatewayError::UpstreamUnavailable(_) => "BAD_GATEWAY",
            GatewayError::BodyTooLarge => "PAYLOAD_TOO_LARGE",
        }
    }

    /// Render the error, tagging the body with the request's ID.
    pub fn into_response_for(self, request_id: Option<&RequestId>) -> Response {
        if let GatewayError::UpstreamUnavailable(err) = &self {
            tracing::error!(
                error = %err,
                request_id = request_id.map(RequestId::as_str).unwrap_or("-"),
                "upstream request failed"
            );
        }

        let body = ApiErrorResponse::new("gateway", self.code(), self.to_string())
            .with_request_id(request_id);
        (self.status(), Json(body)).into_response()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.into_response_for(None)
    }
}
