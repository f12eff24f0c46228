//! 反向代理：将通过认证的请求原样转发到上游服务

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::CONNECTION, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use common::middleware::auth::AuthErrorBody;
use common::middleware::RequestId;
use common::response::ApiErrorResponse;

use crate::error::GatewayError;
use crate::state::AppState;

/// 请求体大小上限（10 MiB）
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// 不应跨越代理转发的头（RFC 9110 §7.6.1），以及由 HTTP 客户端重新计算的头
const HOP_BY_HOP_HEADERS: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// 创建代理路由，`/api/*` 下的所有请求都转发到上游
pub fn router() -> Router<AppState> {
    Router::new().route("/api/{*path}", any(forward))
}

/// 转发请求到上游服务
///
/// 方法、路径、查询参数、请求头（含 `Authorization`）与请求体保持不变，
/// 上游的状态码、响应头与响应体原样返回。
#[utoipa::path(
    method(get, post, put, patch, delete),
    path = "/api/{path}",
    tag = "proxy",
    params(
        ("path" = String, Path, description = "转发到上游的路径（可含多段）")
    ),
    responses(
        (status = 200, description = "上游响应（状态码、响应头与响应体原样透传）"),
        (status = 401, description = "缺少、格式错误或无效的 Bearer 令牌", body = AuthErrorBody),
        (status = 413, description = "请求体超过大小上限", body = ApiErrorResponse),
        (status = 502, description = "上游服务不可用", body = ApiErrorResponse)
    )
)]
pub async fn forward(State(state): State<AppState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let request_id = parts.extensions.get::<RequestId>().cloned();

    match send_upstream(&state, parts, body).await {
        Ok(response) => response,
        Err(err) => err.into_response_for(request_id.as_ref()),
    }
}

async fn send_upstream(
    state: &AppState,
    parts: Parts,
    body: Body,
) -> Result<Response, GatewayError> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", state.service_urls.upstream, path_and_query);

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| GatewayError::BodyTooLarge)?;

    tracing::debug!(method = %parts.method, url = %url, "转发请求到上游");

    let upstream = state
        .http_client
        .request(parts.method, &url)
        .headers(strip_hop_by_hop(&parts.headers))
        .body(body)
        .send()
        .await
        .map_err(GatewayError::UpstreamUnavailable)?;

    let status = upstream.status();
    let headers = strip_hop_by_hop(upstream.headers());
    let bytes = upstream
        .bytes()
        .await
        .map_err(GatewayError::UpstreamUnavailable)?;

    Ok((status, headers, bytes).into_response())
}

/// 去掉逐跳头：固定列表，加上 `Connection` 头中列出的字段名
fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut forwarded = headers.clone();
    for name in HOP_BY_HOP_HEADERS {
        forwarded.remove(name);
    }
    for name in &connection_listed {
        forwarded.remove(name.as_str());
    }
    forwarded
}
