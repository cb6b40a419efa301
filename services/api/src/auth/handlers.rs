use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::Deserialize;
use tower_sessions::Session;
use worklog_common::WorklogError;
use worklog_jira::client::Credential;

use crate::error::ApiError;
use crate::identity::{current_identity, Identity};
use crate::session::SessionData;
use crate::{found, render_template, AppState};

/// Unguessable `state` token for the authorization redirect.
fn random_state_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Anything unexpected during the callback is reported as a generic 500
/// rather than leaking internals.
fn auth_failed(err: WorklogError) -> ApiError {
    tracing::error!(error = %err, "authentication flow failed");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "authentication failed")
}

pub async fn login_page(State(state): State<AppState>) -> Result<Response, ApiError> {
    let ctx = tera::Context::new();
    Ok(render_template(&state, "login.html", &ctx)?.into_response())
}

pub async fn authorize(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, ApiError> {
    let session = SessionData::new(session);

    let state_token = random_state_token();
    session.set_oauth_state(&state_token).await?;

    let url = state.oauth.authorize_url(&state_token).map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("invalid authorize URL: {e}"),
        )
    })?;
    Ok(Redirect::temporary(url.as_str()).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    let session = SessionData::new(session);

    if let Some(provider_error) = params.error {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("oauth error: {provider_error}"),
        ));
    }

    let code = match params.code {
        Some(code) if !code.is_empty() => code,
        _ => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "missing authorization code",
            ))
        }
    };

    let stored_state = session.oauth_state().await.map_err(auth_failed)?;
    if stored_state.is_none() || stored_state != params.state {
        // stored oauth_state stays in the session for audit
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid state parameter",
        ));
    }

    let tokens = state.oauth.exchange_code(&code).await.map_err(|e| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("failed to exchange authorization code for tokens: {e}"),
        )
    })?;

    let Some(access_token) = tokens.access_token else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "no access token received",
        ));
    };

    let credential = Credential::Bearer {
        access_token: access_token.clone(),
    };
    let user = state.jira.get_myself(&credential).await.map_err(|e| {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            format!("failed to fetch user info: {e}"),
        )
    })?;

    session
        .set_access_token(&access_token)
        .await
        .map_err(auth_failed)?;
    if let Some(refresh_token) = tokens.refresh_token {
        session
            .set_refresh_token(&refresh_token)
            .await
            .map_err(auth_failed)?;
    }
    session.set_user_info(&user).await.map_err(auth_failed)?;
    session.remove_oauth_state().await.map_err(auth_failed)?;

    tracing::info!(account_id = %user.account_id, "login completed");
    Ok(found("/ui/worklogs"))
}

pub async fn logout(session: Session) -> Result<Response, ApiError> {
    let session = SessionData::new(session);
    session.clear().await?;
    Ok(found("/auth/login"))
}

pub async fn me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = SessionData::new(session);
    match current_identity(&state.jira, &state.oauth, &session).await? {
        Identity::Authenticated(identity) => Ok(Json(serde_json::json!({
            "accountId": identity.account_id,
            "displayName": identity.display_name,
            "email": identity.email,
        }))),
        Identity::Unauthenticated { reason } => {
            Err(ApiError::new(StatusCode::UNAUTHORIZED, reason))
        }
    }
}
