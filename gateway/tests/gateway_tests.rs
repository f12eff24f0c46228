//! Gateway integration tests.
//!
//! Drives the assembled router with a real HS256 validator in front of a
//! wiremock upstream, checking both halves of the gate: rejected requests
//! never reach the upstream, accepted ones reach it exactly once, unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use common::auth::{Claims, JwtTokenValidator};
use common::config::{AppConfig, ServiceUrls};
use common::middleware::{AuthGate, TokenValidator};
use gateway::{create_router, state::AppState};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;
use wiremock::matchers::{any, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-secret";

fn build_app(upstream: &str, validator: Arc<dyn TokenValidator>, timeout_secs: &str) -> Router {
    let vars = HashMap::from([
        ("UPSTREAM_URL".to_string(), upstream.to_string()),
        ("REQUEST_TIMEOUT_SECONDS".to_string(), timeout_secs.to_string()),
    ]);
    let config = AppConfig::from_vars("gateway", &vars).unwrap();
    let service_urls = ServiceUrls::from_vars(&vars).unwrap();
    let state = AppState::new(config, service_urls, AuthGate::new(validator)).unwrap();
    create_router(state)
}

fn jwt_app(upstream: &str) -> Router {
    build_app(
        upstream,
        Arc::new(JwtTokenValidator::new(SECRET.as_bytes(), 0)),
        "5",
    )
}

fn token_expiring_in(seconds: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "user-1".to_string(),
        exp: now + seconds,
        iat: Some(now),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn read_body(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn upstream_never_called() -> MockServer {
    let upstream = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    upstream
}

#[tokio::test]
async fn missing_header_is_rejected_before_upstream() {
    let upstream = upstream_never_called().await;
    let req = Request::builder()
        .uri("/api/orders")
        .body(Body::empty())
        .unwrap();

    let resp = jwt_app(&upstream.uri()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("content-type").unwrap(), "application/json");
    assert!(resp.headers().get("x-request-id").is_some());
    assert_eq!(
        read_body(resp).await,
        r#"{"error":"unauthorized","error_description":"Missing Authorization header","status":401}"#
    );
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected_before_upstream() {
    let upstream = upstream_never_called().await;
    let req = Request::builder()
        .uri("/api/orders")
        .header("authorization", "Token abc123")
        .body(Body::empty())
        .unwrap();

    let resp = jwt_app(&upstream.uri()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        read_body(resp).await,
        r#"{"error":"unauthorized","error_description":"Invalid Authorization header","status":401}"#
    );
}

#[tokio::test]
async fn invalid_and_expired_tokens_are_rejected_before_upstream() {
    let upstream = upstream_never_called().await;
    let expired = format!("Bearer {}", token_expiring_in(-600));

    for value in ["Bearer badtoken", expired.as_str()] {
        let req = Request::builder()
            .uri("/api/orders")
            .header("authorization", value)
            .body(Body::empty())
            .unwrap();

        let resp = jwt_app(&upstream.uri()).oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_body(resp).await,
            r#"{"error":"unauthorized","error_description":"Invalid or expired JWT token","status":401}"#
        );
    }
}

#[tokio::test]
async fn valid_token_is_forwarded_unchanged_once() {
    let upstream = MockServer::start().await;
    let bearer = format!("Bearer {}", token_expiring_in(600));

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(query_param("page", "2"))
        .and(header("authorization", bearer.as_str()))
        .and(header("x-client", "mobile"))
        .and(body_string("{\"item\":42}"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-upstream", "orders")
                .set_body_string("created"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/orders?page=2")
        .header("authorization", bearer.as_str())
        .header("x-client", "mobile")
        .body(Body::from("{\"item\":42}"))
        .unwrap();

    let resp = jwt_app(&upstream.uri()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(resp.headers().get("x-upstream").unwrap(), "orders");
    assert_eq!(read_body(resp).await, "created");
}

#[tokio::test]
async fn health_check_is_public() {
    let upstream = upstream_never_called().await;
    let req = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let resp = jwt_app(&upstream.uri()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&read_body(resp).await).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn unreachable_upstream_returns_bad_gateway() {
    // Port 1 is never served in the test environment
    let app = jwt_app("http://127.0.0.1:1");
    let req = Request::builder()
        .uri("/api/orders")
        .header("authorization", format!("Bearer {}", token_expiring_in(600)))
        .header("x-request-id", "req-upstream-down")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = serde_json::from_str(&read_body(resp).await).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_GATEWAY");
    assert_eq!(body["meta"]["request_id"], "req-upstream-down");
    assert_eq!(body["meta"]["service"], "gateway");
}

#[tokio::test]
async fn openapi_documents_proxied_route_and_its_401() {
    let upstream = upstream_never_called().await;
    let req = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();

    let resp = jwt_app(&upstream.uri()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_str(&read_body(resp).await).unwrap();
    let unauthorized = &doc["paths"]["/api/{path}"]["get"]["responses"]["401"];
    assert_eq!(
        unauthorized["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/AuthErrorBody"
    );
    assert!(doc["components"]["schemas"]["AuthErrorBody"].is_object());
}

#[tokio::test]
async fn stalled_validation_is_abandoned_on_timeout() {
    struct StalledValidator;

    #[async_trait]
    impl TokenValidator for StalledValidator {
        async fn validate(&self, _token: &str) -> bool {
            std::future::pending::<bool>().await
        }
    }

    let upstream = upstream_never_called().await;
    let app = build_app(&upstream.uri(), Arc::new(StalledValidator), "1");
    let req = Request::builder()
        .uri("/api/orders")
        .header("authorization", "Bearer slowtoken")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
}
