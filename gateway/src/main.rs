//! API 网关服务入口

use std::sync::Arc;

use anyhow::Context;
use common::auth::JwtTokenValidator;
use common::config::{AppConfig, AuthConfig, ServiceUrls};
use common::middleware::AuthGate;
use gateway::{create_router, state::AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "gateway";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME).context("加载服务配置失败")?;
    let auth_config = AuthConfig::load().context("加载认证配置失败")?;
    let service_urls = ServiceUrls::load().context("加载上游地址失败")?;

    // 令牌校验器显式注入认证闸门
    let validator = Arc::new(JwtTokenValidator::from_config(&auth_config));
    let auth_gate = AuthGate::new(validator);

    let state = AppState::new(config.clone(), service_urls.clone(), auth_gate)
        .context("创建 HTTP 客户端失败")?;
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_address();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        upstream = %service_urls.upstream,
        "启动 API 网关"
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务运行失败")?;

    info!(service = SERVICE_NAME, "API 网关已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // 无法监听信号时继续服务，由外部进程管理器终止
        warn!(error = %err, "监听退出信号失败");
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，开始优雅停机");
}
