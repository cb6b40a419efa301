pub mod handlers;
pub mod requests;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/jira-worklogs/summary", post(handlers::api_summary))
        .route(
            "/ui/worklogs",
            get(handlers::ui_form).post(handlers::ui_submit),
        )
}
