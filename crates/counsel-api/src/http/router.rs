//! Axum router configuration with middleware.
//!
//! All REST routes are under `/api/v1/`. The realtime channel lives at
//! `/ws` and `/health` is unauthenticated. Middleware: CORS, tracing.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Accounts
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/users/{id}", get(handlers::user::get_user))
        .route("/users/{id}/sessions", get(handlers::session::list_sessions))
        .route("/users/{id}/files", get(handlers::user::list_user_files))
        // Sessions and chat
        .route("/sessions", post(handlers::session::create_session))
        .route(
            "/sessions/{id}/messages",
            get(handlers::session::get_messages),
        )
        .route("/chat/message", post(handlers::chat::send_message))
        // Documents (multipart bodies up to 25 MB)
        .route(
            "/documents/upload",
            post(handlers::upload::upload_document).layer(DefaultBodyLimit::max(25 * 1024 * 1024)),
        )
        // Payments
        .route("/payments/initialize", post(handlers::payment::initialize))
        .route("/payments/callback", post(handlers::payment::callback));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/ws", get(handlers::ws::ws_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
