use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use tower_sessions::Session;
use worklog_jira::aggregate::{aggregate, DaySummary};
use worklog_jira::client::Credential;

use crate::error::ApiError;
use crate::identity::{current_identity, AuthenticatedIdentity, Identity};
use crate::session::SessionData;
use crate::worklogs::requests::{SummaryForm, SummaryRequest};
use crate::{found, render_template, AppState};

const BAD_RANGE: &str = "endDate must be greater than or equal to startDate";

async fn resolve(state: &AppState, session: &SessionData) -> Result<Identity, ApiError> {
    Ok(current_identity(&state.jira, &state.oauth, session).await?)
}

fn bearer(identity: &AuthenticatedIdentity) -> Credential {
    Credential::Bearer {
        access_token: identity.access_token.clone(),
    }
}

pub async fn api_summary(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SummaryRequest>,
) -> Result<Json<Vec<DaySummary>>, ApiError> {
    let session = SessionData::new(session);
    let identity = match resolve(&state, &session).await? {
        Identity::Authenticated(identity) => identity,
        Identity::Unauthenticated { reason } => {
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, reason))
        }
    };

    if body.end_date < body.start_date {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, BAD_RANGE));
    }

    let account_id = body
        .account_id
        .unwrap_or_else(|| identity.account_id.clone());
    let credential = bearer(&identity);

    let days = aggregate(
        &state.jira,
        &credential,
        &account_id,
        &body.start_date.to_string(),
        &body.end_date.to_string(),
    )
    .await?;
    Ok(Json(days))
}

pub async fn ui_form(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, ApiError> {
    let session = SessionData::new(session);
    match resolve(&state, &session).await? {
        Identity::Authenticated(_) => {
            let mut ctx = tera::Context::new();
            ctx.insert("data", &serde_json::Value::Null);
            Ok(render_template(&state, "worklog_summary.html", &ctx)?.into_response())
        }
        Identity::Unauthenticated { .. } => Ok(found("/auth/login")),
    }
}

pub async fn ui_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SummaryForm>,
) -> Result<Response, ApiError> {
    let session = SessionData::new(session);
    let identity = match resolve(&state, &session).await? {
        Identity::Authenticated(identity) => identity,
        Identity::Unauthenticated { .. } => return Ok(found("/auth/login")),
    };

    if form.end_date < form.start_date {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, BAD_RANGE));
    }

    let credential = bearer(&identity);
    let data = aggregate(
        &state.jira,
        &credential,
        &form.account_id,
        &form.start_date,
        &form.end_date,
    )
    .await?;

    let mut ctx = tera::Context::new();
    ctx.insert("data", &data);
    ctx.insert("accountId", &form.account_id);
    ctx.insert("startDate", &form.start_date);
    ctx.insert("endDate", &form.end_date);
    Ok(render_template(&state, "worklog_summary.html", &ctx)?.into_response())
}
