//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::throttle::RequestBudget;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS middleware: allow localhost origins for the browser client.
    // Use the configured port plus port+1 for a dev server.
    let port = state.config.general.port;
    let dev_port = port.saturating_add(1);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            format!("http://127.0.0.1:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://127.0.0.1:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
        ]))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Routes that do NOT require authentication.
    let public_routes = Router::new().route("/health", get(handlers::health));

    // Multipart endpoints need body limits above the 1MB global default.
    let voice_limit = state.config.voice.max_audio_bytes + 64 * 1024;
    let upload_limit = state.config.uploads.max_file_bytes + 64 * 1024;

    let budget = RequestBudget::new(state.config.general.rate_limit_per_sec);

    let throttled_routes = Router::new()
        .route(
            "/api/chat",
            post(handlers::chat).delete(handlers::delete_chat),
        )
        .route("/api/chat/{id}/messages", get(handlers::chat_messages))
        .route("/api/history", get(handlers::history))
        .route("/api/models", get(handlers::models))
        .route(
            "/api/vote",
            get(handlers::list_votes).patch(handlers::patch_vote),
        )
        .route("/api/document", get(handlers::get_document))
        .route("/api/suggestions", get(handlers::list_suggestions))
        .route(
            "/api/voice",
            post(handlers::voice).layer(DefaultBodyLimit::max(voice_limit)),
        )
        .route(
            "/api/files/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(axum::middleware::from_fn(
            crate::throttle::throttle_middleware,
        ))
        .layer(axum::Extension(budget));

    // All API routes sit behind session auth.
    let protected_routes = throttled_routes.route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        crate::auth::require_session,
    ));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Binds to 127.0.0.1 (localhost only) on the port from config.
pub async fn start_server(state: AppState) -> Result<(), parley_core::error::ParleyError> {
    let port = state.config.general.port;
    let addr = format!("127.0.0.1:{}", port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| parley_core::error::ParleyError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| parley_core::error::ParleyError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
