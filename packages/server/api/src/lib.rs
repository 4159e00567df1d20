use axum::{http, routing::get, Json, Router};
use serde_json::json;
use sha2::Digest;

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;

use state::AppState;

/// Builds the full service router, including the CORS and signed
/// session layers, so the binary and the integration tests serve the
/// exact same surface.
pub fn app(state: AppState) -> Router {
    // Setup CORS
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::mirror_request())
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            http::header::ACCEPT,
        ])
        .allow_credentials(true);

    // Initialize Session Store
    let session_store = tower_sessions::MemoryStore::default();
    let session_layer = tower_sessions::SessionManagerLayer::new(session_store)
        .with_signed(session_key(state.config.session_secret.as_deref()))
        .with_secure(false) // Set to true in production with HTTPS
        .with_same_site(tower_sessions::cookie::SameSite::Lax);

    Router::new()
        .route("/health", get(health_check))
        .merge(handlers::auth::router())
        .merge(handlers::generate::router())
        .merge(handlers::ui::router())
        .layer(session_layer)
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Session cookie signing key. A configured secret is stretched to the
/// 64 bytes the key type requires; without one, a fresh random key is
/// generated once per process, so sessions do not survive a restart.
fn session_key(secret: Option<&str>) -> tower_sessions::cookie::Key {
    match secret {
        Some(secret) => {
            let digest = sha2::Sha512::digest(secret.as_bytes());
            tower_sessions::cookie::Key::from(digest.as_slice())
        }
        None => tower_sessions::cookie::Key::generate(),
    }
}
