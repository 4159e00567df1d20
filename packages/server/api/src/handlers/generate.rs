use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use shared::dto::{GenerateAccepted, GenerationRequest, ValidateRequest};
use tower_sessions::Session;

use crate::error::ApiError;
use crate::services::orchestrator::Orchestrator;
use crate::state::AppState;

use super::auth::session_token;

const LOGIN_REQUIRED: &str = "GitHub login required. Go to /login/github";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate_handler))
        .route("/generate", post(generate_handler))
        .route("/deploy", post(deploy_handler))
        .route("/me", get(me_handler))
        .route("/check/:project_name", get(check_handler))
}

pub async fn validate_handler(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<Value>, ApiError> {
    let expected = state
        .config
        .secret_key
        .clone()
        .unwrap_or_else(|| "secret123".to_string());

    if request.secret_key != expected {
        return Err(ApiError::InvalidSecret);
    }
    Ok(Json(json!({ "valid": true })))
}

/// Asynchronous variant: acknowledges immediately and runs the pipeline
/// on a detached task. Downstream failures after the 202 are only
/// visible in the logs; there is no result channel back to the caller.
pub async fn generate_handler(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<GenerationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.config.secret_mismatch(request.secret_key.as_deref()) {
        return Err(ApiError::InvalidSecret);
    }
    let Some(token) = session_token(&session).await else {
        return Err(ApiError::Auth(LOGIN_REQUIRED));
    };

    // Best-guess repository URL for the acknowledgement. Prefer the
    // login behind the session token; fall back to the configured hint.
    let login = match state.publisher.whoami(&token).await {
        Ok(user) => Some(user.login),
        Err(_) => state.config.github_user_hint.clone(),
    };
    let expected_repo_html =
        login.map(|login| format!("https://github.com/{}/{}", login, request.project_name));

    let accepted = GenerateAccepted {
        status: "accepted".to_string(),
        project_name: request.project_name.clone(),
        message: "Generation started".to_string(),
        expected_repo_html,
    };

    // Fire and forget: the handle is dropped, never awaited.
    Orchestrator::from_state(&state).spawn(request, token);

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// Synchronous variant: runs the full pipeline inline and returns the
/// published repository, or 500 when the publish step fails.
pub async fn deploy_handler(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<Value>, ApiError> {
    if state.config.secret_mismatch(request.secret_key.as_deref()) {
        return Err(ApiError::InvalidSecret);
    }
    let Some(token) = session_token(&session).await else {
        return Err(ApiError::Auth(LOGIN_REQUIRED));
    };

    let repo = Orchestrator::from_state(&state).run(&request, &token).await?;

    Ok(Json(json!({ "status": "deployed", "repo": repo })))
}

pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Value>, ApiError> {
    let Some(token) = session_token(&session).await else {
        return Err(ApiError::Auth(LOGIN_REQUIRED));
    };

    match state.publisher.whoami(&token).await {
        Ok(user) => Ok(Json(json!({
            "login": user.login,
            "html_url": user.html_url
        }))),
        Err(_) => Err(ApiError::Auth("Invalid GitHub session. Please login again.")),
    }
}

/// Repository existence probe under the caller's identity. Accepts the
/// session credential or, failing that, the configured server token.
pub async fn check_handler(
    State(state): State<AppState>,
    session: Session,
    Path(project_name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let token = match session_token(&session).await {
        Some(token) => token,
        None => state
            .config
            .github_token
            .clone()
            .ok_or(ApiError::Auth("No GitHub token available"))?,
    };

    // Any remote failure along the way reads as "does not exist".
    let repo = async {
        let user = state.publisher.whoami(&token).await.ok()?;
        let full_name = format!("{}/{}", user.login, project_name);
        state.publisher.find_repo(&token, &full_name).await.ok().flatten()
    }
    .await;

    match repo {
        Some(repo) => Ok(Json(json!({
            "exists": true,
            "full_name": repo.full_name,
            "html_url": repo.html_url
        }))),
        None => Ok(Json(json!({ "exists": false }))),
    }
}
