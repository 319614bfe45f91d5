//! GraphQL 服务路由模块

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    Extension,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::config::Environment;
use common::db::ConnectionState;
use common::middleware::RequestId;

use crate::state::AppState;

const GRAPHQL_PATH: &str = "/api";

/// 创建路由
///
/// 非生产环境下 `GET /api` 返回 GraphiQL 页面，生产环境下 GET 与 POST 均执行查询。
pub fn router(environment: Environment) -> Router<AppState> {
    let graphql = if environment.is_production() {
        get(graphql_handler).post(graphql_handler)
    } else {
        get(graphiql).post(graphql_handler)
    };

    Router::new()
        .route(GRAPHQL_PATH, graphql)
        .route("/api/health", get(health_check))
}

async fn graphql_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner().data(request_id)).await.into()
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse),
        (status = 503, description = "数据库连接失败", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connection = state.catalog.connection_state();
    let (status, code) = match connection {
        ConnectionState::Failed => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE),
        _ => ("healthy", StatusCode::OK),
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            service: state.config.service_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.config.environment.to_string(),
            timestamp: Utc::now(),
            database: DatabaseHealth {
                name: state.catalog.database_name().to_string(),
                state: connection,
            },
        }),
    )
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 运行环境
    pub environment: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 数据库连接
    pub database: DatabaseHealth,
}

/// 数据库连接状态
#[derive(Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub name: String,
    pub state: ConnectionState,
}
