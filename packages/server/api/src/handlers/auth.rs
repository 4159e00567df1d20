use axum::http::StatusCode;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use std::time::Duration;
use tower_sessions::Session;

use crate::state::AppState;

/// Session key holding the authenticated user's GitHub access token.
pub const GH_TOKEN_KEY: &str = "gh_token";
/// Session key holding the pending OAuth state nonce.
const OAUTH_STATE_KEY: &str = "oauth_state";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/github", get(login_github))
        .route("/auth/callback", get(callback_handler))
        .route("/logout", get(logout_handler))
}

/// Reads the session credential, if any. Pure session lookup, no
/// network call.
pub async fn session_token(session: &Session) -> Option<String> {
    session.get::<String>(GH_TOKEN_KEY).await.unwrap_or(None)
}

pub async fn login_github(State(state): State<AppState>, session: Session) -> Response {
    let Some(client_id) = state.config.github_client_id.clone() else {
        return (
            StatusCode::BAD_REQUEST,
            "GitHub Client ID is not configured. Please update your .env file with real credentials.",
        )
            .into_response();
    };

    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    if let Err(e) = session.insert(OAUTH_STATE_KEY, nonce.clone()).await {
        tracing::error!("failed to store oauth state in session: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let url = format!(
        "https://github.com/login/oauth/authorize?client_id={}&redirect_uri={}&scope=repo&state={}",
        client_id, state.config.github_redirect_uri, nonce
    );

    Redirect::to(&url).into_response()
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Deserialize)]
struct GithubTokenResponse {
    access_token: Option<String>,
}

pub async fn callback_handler(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    // The nonce is single-use: remove it from the session up front so a
    // replayed callback with the same state is rejected.
    let stored_state: Option<String> = session.remove(OAUTH_STATE_KEY).await.unwrap_or(None);

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Redirect::to("/ui").into_response();
    };
    if stored_state.as_deref() != Some(returned_state.as_str()) {
        return Redirect::to("/ui").into_response();
    }

    let (Some(client_id), Some(client_secret)) = (
        state.config.github_client_id.clone(),
        state.config.github_client_secret.clone(),
    ) else {
        tracing::warn!("GITHUB_CLIENT_ID or GITHUB_CLIENT_SECRET not set, cannot complete login");
        return Redirect::to("/ui").into_response();
    };

    // Exchange the code for an access token
    let client = reqwest::Client::new();
    let token_res = match client
        .post("https://github.com/login/oauth/access_token")
        .header("Accept", "application/json")
        .form(&[
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("code", code.as_str()),
        ])
        .timeout(Duration::from_secs(20))
        .send()
        .await
    {
        Ok(res) => res,
        Err(e) => {
            tracing::error!("GitHub token exchange failed: {}", e);
            return Redirect::to("/ui").into_response();
        }
    };

    let token_data: GithubTokenResponse = match token_res.json().await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("failed to parse GitHub token response: {}", e);
            return Redirect::to("/ui").into_response();
        }
    };

    if let Some(access_token) = token_data.access_token {
        if let Err(e) = session.insert(GH_TOKEN_KEY, access_token).await {
            tracing::error!("failed to store access token in session: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    Redirect::to("/login").into_response()
}

pub async fn logout_handler(session: Session) -> Redirect {
    session.clear().await;
    Redirect::to("/login")
}
