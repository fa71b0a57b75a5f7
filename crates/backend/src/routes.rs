use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::domain::a001_agent::repository::{AgentRepository, AgentStore};
use crate::domain::a002_pre_order::repository::PreOrderRepository;
use crate::handlers;
use crate::shared::config::{ImportConfig, ServerConfig};

/// Общее состояние обработчиков
#[derive(Clone)]
pub struct AppState {
    pub agents: Arc<dyn AgentStore>,
    pub pre_orders: PreOrderRepository,
}

impl AppState {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            agents: Arc::new(AgentRepository::new(conn.clone())),
            pre_orders: PreOrderRepository::new(conn),
        }
    }
}

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState, server: &ServerConfig, import: &ImportConfig) -> Router {
    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        // A001 Agent
        .route(
            "/api/agents",
            get(handlers::a001_agent::list)
                .post(handlers::a001_agent::create)
                .put(handlers::a001_agent::update)
                .delete(handlers::a001_agent::delete),
        )
        .route("/api/agents/:id", get(handlers::a001_agent::get_by_id))
        .route(
            "/api/agents/upload",
            post(handlers::a001_agent::upload)
                .layer(DefaultBodyLimit::max(import.max_upload_bytes())),
        )
        // A002 Pre-order
        .route(
            "/api/pre-orders",
            get(handlers::a002_pre_order::list).post(handlers::a002_pre_order::create),
        )
        .route(
            "/api/pre-orders/:id",
            patch(handlers::a002_pre_order::update),
        )
        .with_state(state);

    match &server.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}
