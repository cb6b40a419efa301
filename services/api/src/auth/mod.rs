pub mod handlers;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(handlers::login_page))
        .route("/auth/authorize", get(handlers::authorize))
        .route("/auth/callback", get(handlers::callback))
        .route("/auth/logout", get(handlers::logout))
        .route("/auth/me", get(handlers::me))
}
