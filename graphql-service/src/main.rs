//! 课程目录 GraphQL 服务
//!
//! 提供以下功能：
//! - `/api` 上的 GraphQL 查询与变更（课程、学生、选课）
//! - 非生产环境下的 GraphiQL 调试页面
//! - 懒加载的单一 MongoDB 连接，连接失败时进程以非零状态退出

mod models;
mod routes;
mod schema;
mod state;
mod store;

use std::future::{Future, IntoFuture};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::db::{ConnectionCache, MongoConnector};
use common::errors::{AppError, ConnectionError};
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use store::{CatalogStore, MongoCatalog};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "graphql-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "课程目录服务 API",
        version = "0.1.0",
        description = "课程目录 GraphQL 服务（GraphQL 端点位于 /api）"
    ),
    paths(routes::health_check),
    components(schemas(
        routes::HealthResponse,
        routes::DatabaseHealth,
        common::db::ConnectionState,
    )),
    tags(
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> ExitCode {
    // .env 文件可选
    dotenvy::dotenv().ok();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(service = SERVICE_NAME, error = %format!("{e:#}"), "服务异常退出");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load_with_service(SERVICE_NAME).context("加载配置失败")?;

    // 连接失败通过该通道上报，由此处终止进程
    let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();
    let cache = Arc::new(
        ConnectionCache::new(MongoConnector::new(SERVICE_NAME), config.database.clone())
            .with_fatal_notifier(fatal_tx),
    );

    if config.connect_on_startup {
        cache.get().await.context("启动时连接数据库失败")?;
    }

    let catalog: Arc<dyn CatalogStore> = Arc::new(MongoCatalog::new(cache));
    let state = AppState::new(config.clone(), catalog);
    let app = create_router(state);

    let addr = config.bind_address();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        environment = %config.environment,
        cors = config.cors_enabled,
        "启动服务"
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    supervise(server.into_future(), fatal_rx).await?;
    info!(service = SERVICE_NAME, "服务已停止");
    Ok(())
}

/// 运行服务直至其结束，或在收到数据库连接失败时立即返回错误
async fn supervise<F>(
    server: F,
    mut fatal_rx: mpsc::UnboundedReceiver<ConnectionError>,
) -> anyhow::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = server => result.context("服务运行失败"),
        Some(err) = fatal_rx.recv() => Err(AppError::from(err)).context("数据库连接失败"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "无法监听关闭信号");
        std::future::pending::<()>().await;
    }
}

fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(routes::router(state.config.environment))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router.with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
