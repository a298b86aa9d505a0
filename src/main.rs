//src/main.rs

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, tenant_guard};

fn router(app_state: AppState) -> Router {
    // Formulários das landing pages (sem login)
    let public_routes = Router::new().route("/leads", post(handlers::leads::submit_lead));

    // Auth roda primeiro (camada mais externa), depois a checagem de organização
    let crm_routes = Router::new()
        .route("/duplicates", get(handlers::dedup::list_duplicates))
        .route("/duplicates/merge", post(handlers::dedup::merge_contacts))
        .route("/duplicates/merge-all", post(handlers::dedup::merge_all_duplicates))
        .route(
            "/duplicates/{match_type}/{key}",
            get(handlers::dedup::get_duplicate_group),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let hr_routes = Router::new()
        .route(
            "/employees/contact-suggestions",
            get(handlers::employees::list_contact_suggestions),
        )
        .route("/employees/{id}/contact", post(handlers::employees::link_contact))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/public", public_routes)
        .nest("/api/crm", crm_routes)
        .nest("/api/hr", hr_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let app_state = AppState::new().await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let listener = TcpListener::bind(&app_state.config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, router(app_state)).await?;
    Ok(())
}
