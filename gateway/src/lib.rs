//! API 网关
//!
//! 作为所有客户端请求的入口点：
//! - Bearer 令牌认证闸门（未通过的请求直接返回 401）
//! - 将通过认证的 `/api/*` 请求转发到上游服务
//! - 请求 ID、访问日志、CORS 与超时控制

pub mod error;
pub mod proxy;
pub mod routes;
pub mod state;

use axum::{
    error_handling::HandleErrorLayer, http::StatusCode, middleware, routing::get, Json, Router,
};
use common::middleware::auth::{auth_middleware, AuthErrorBody};
use common::middleware::request_id::request_id_middleware;
use common::response::ApiErrorResponse;
use tower::{timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "API 网关",
        version = "0.1.0",
        description = "带 Bearer 认证闸门的 API 网关"
    ),
    paths(routes::health_check, proxy::forward),
    components(schemas(routes::HealthResponse, AuthErrorBody, ApiErrorResponse)),
    tags(
        (name = "health", description = "健康检查端点"),
        (name = "proxy", description = "经认证闸门转发到上游的端点")
    )
)]
pub struct ApiDoc;

/// 组装网关路由
///
/// 健康检查与 OpenAPI 文档公开访问；代理路由挂在认证闸门之后。
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = proxy::router().route_layer(middleware::from_fn_with_state(
        state.auth_gate.clone(),
        auth_middleware,
    ));

    // 超时后内部 future（包括进行中的令牌校验）被丢弃，由这里写出 408
    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_timeout_error))
        .layer(TimeoutLayer::new(state.config.request_timeout));

    Router::new()
        .merge(routes::router())
        .merge(protected)
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(timeout)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn handle_timeout_error(err: BoxError) -> StatusCode {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("请求处理超时");
        StatusCode::REQUEST_TIMEOUT
    } else {
        tracing::error!(error = %err, "未处理的中间件错误");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
