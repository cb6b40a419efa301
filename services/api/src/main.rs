mod auth;
mod error;
mod identity;
mod session;
mod worklogs;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use worklog_config::{init_tracing, AppConfig};
use worklog_jira::client::JiraClient;
use worklog_jira::oauth::{OAuthClient, OAuthConfig};

use crate::error::ApiError;

pub const SESSION_COOKIE_NAME: &str = "session";
const SESSION_MAX_AGE_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jira: JiraClient,
    pub oauth: OAuthClient,
    pub templates: Arc<tera::Tera>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub(crate) fn render_template(
    state: &AppState,
    name: &str,
    ctx: &tera::Context,
) -> Result<Html<String>, ApiError> {
    state.templates.render(name, ctx).map(Html).map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("template error: {e}"),
        )
    })
}

pub(crate) fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

fn build_router(state: AppState) -> Router {
    let key = Key::from(state.config.session_secret.as_bytes());
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_same_site(SameSite::Lax)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_MAX_AGE_DAYS)))
        .with_signed(key);

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse::<HeaderValue>().unwrap(),
            "http://127.0.0.1:3000".parse::<HeaderValue>().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(worklogs::router())
        .layer(session_layer)
        .layer(cors)
        .with_state(state)
}

fn build_state(config: AppConfig) -> AppState {
    let jira = JiraClient::new(config.jira_base_url());
    let oauth = OAuthClient::new(OAuthConfig {
        client_id: config.oauth_client_id.clone(),
        client_secret: config.oauth_client_secret.clone(),
        redirect_uri: config.oauth_redirect_uri.clone(),
        authorize_url: config.oauth_authorize_url.clone(),
        token_url: config.oauth_token_url.clone(),
    });
    let templates = tera::Tera::new(&format!("{}/**/*.html", config.template_path))
        .expect("failed to load templates");

    AppState {
        config: Arc::new(config),
        jira,
        oauth,
        templates: Arc::new(templates),
    }
}

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = AppConfig::from_env().expect("failed to load config");
    tracing::info!(service = "worklog-api", "starting");

    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");
    let app = build_router(build_state(config));

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ACCOUNT: &str = "acct-1";

    fn test_state(server: &MockServer) -> AppState {
        let config = AppConfig {
            jira_domain: "acme.atlassian.net".to_string(),
            jira_email: "bot@acme.test".to_string(),
            jira_api_token: "token".to_string(),
            oauth_client_id: "client-id".to_string(),
            oauth_client_secret: "client-secret".to_string(),
            oauth_redirect_uri: "http://localhost:8000/auth/callback".to_string(),
            oauth_authorize_url: format!("{}/authorize", server.uri()),
            oauth_token_url: format!("{}/oauth/token", server.uri()),
            session_secret: "k".repeat(64),
            template_path: "../../templates".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: "info".to_string(),
        };

        let jira = JiraClient::new(server.uri());
        let oauth = OAuthClient::new(OAuthConfig {
            client_id: config.oauth_client_id.clone(),
            client_secret: config.oauth_client_secret.clone(),
            redirect_uri: config.oauth_redirect_uri.clone(),
            authorize_url: config.oauth_authorize_url.clone(),
            token_url: config.oauth_token_url.clone(),
        });
        let templates = tera::Tera::new("../../templates/**/*.html")
            .expect("test templates should load");

        AppState {
            config: Arc::new(config),
            jira,
            oauth,
            templates: Arc::new(templates),
        }
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, cookie: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn session_cookie(response: &axum::http::Response<Body>) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .expect("response should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    fn state_param(location: &str) -> String {
        location
            .split("state=")
            .nth(1)
            .expect("redirect should carry a state param")
            .split('&')
            .next()
            .unwrap()
            .to_string()
    }

    async fn read_body(response: axum::http::Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn read_body_string(response: axum::http::Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn mount_oauth_success(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 3600
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accountId": ACCOUNT,
                "displayName": "Mia Krystof",
                "emailAddress": "mia@example.com"
            })))
            .mount(server)
            .await;
    }

    /// Run the authorize + callback legs and return an authenticated cookie.
    async fn login(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(get_request("/auth/authorize", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let cookie = session_cookie(&response);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let state = state_param(&location);

        let response = app
            .clone()
            .oneshot(get_request(
                &format!("/auth/callback?code=the-code&state={state}"),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/ui/worklogs"
        );

        cookie
    }

    // ── Health ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn health_returns_ok() {
        let server = MockServer::start().await;
        let app = build_router(test_state(&server));

        let response = app.oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert_eq!(body["status"], "ok");
    }

    // ── Authentication gating ───────────────────────────────────────

    #[tokio::test]
    async fn api_summary_rejects_anonymous() {
        let server = MockServer::start().await;
        let app = build_router(test_state(&server));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/jira-worklogs/summary")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({"startDate": "2024-01-01", "endDate": "2024-01-10"})
                    .to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn ui_redirects_anonymous_to_login() {
        let server = MockServer::start().await;
        let app = build_router(test_state(&server));

        let response = app.oneshot(get_request("/ui/worklogs", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login"
        );
    }

    #[tokio::test]
    async fn me_rejects_anonymous() {
        let server = MockServer::start().await;
        let app = build_router(test_state(&server));

        let response = app.oneshot(get_request("/auth/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // ── OAuth flow ──────────────────────────────────────────────────

    #[tokio::test]
    async fn authorize_redirects_to_provider_with_state() {
        let server = MockServer::start().await;
        let app = build_router(test_state(&server));

        let response = app
            .oneshot(get_request("/auth/authorize", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.starts_with(&format!("{}/authorize", server.uri())));
        assert!(location.contains("client_id=client-id"));
        assert!(!state_param(location).is_empty());
    }

    #[tokio::test]
    async fn callback_without_code_is_rejected() {
        let server = MockServer::start().await;
        let app = build_router(test_state(&server));

        let response = app
            .oneshot(get_request("/auth/callback?state=whatever", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn callback_with_provider_error_is_rejected() {
        let server = MockServer::start().await;
        let app = build_router(test_state(&server));

        let response = app
            .oneshot(get_request(
                "/auth/callback?error=access_denied&code=x&state=y",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("access_denied"));
    }

    #[tokio::test]
    async fn callback_state_mismatch_rejected_then_correct_state_succeeds() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        let app = build_router(test_state(&server));

        let response = app
            .clone()
            .oneshot(get_request("/auth/authorize", None))
            .await
            .unwrap();
        let cookie = session_cookie(&response);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let state = state_param(&location);

        // wrong state: rejected, stored oauth_state untouched
        let response = app
            .clone()
            .oneshot(get_request(
                "/auth/callback?code=the-code&state=forged",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // correct state still works afterwards
        let response = app
            .clone()
            .oneshot(get_request(
                &format!("/auth/callback?code=the-code&state={state}"),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn callback_state_is_single_use() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        let app = build_router(test_state(&server));

        let response = app
            .clone()
            .oneshot(get_request("/auth/authorize", None))
            .await
            .unwrap();
        let cookie = session_cookie(&response);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let state = state_param(&location);
        let callback_uri = format!("/auth/callback?code=the-code&state={state}");

        let response = app
            .clone()
            .oneshot(get_request(&callback_uri, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);

        // the stored state is consumed by the successful exchange, so a
        // replay with the same state is rejected
        let response = app
            .clone()
            .oneshot(get_request(&callback_uri, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("state"));
    }

    #[tokio::test]
    async fn failed_token_exchange_is_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;
        let app = build_router(test_state(&server));

        let response = app
            .clone()
            .oneshot(get_request("/auth/authorize", None))
            .await
            .unwrap();
        let cookie = session_cookie(&response);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let state = state_param(&location);

        let response = app
            .clone()
            .oneshot(get_request(
                &format!("/auth/callback?code=bad&state={state}"),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_then_me_returns_profile() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        let app = build_router(test_state(&server));

        let cookie = login(&app).await;

        let response = app
            .oneshot(get_request("/auth/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert_eq!(body["accountId"], ACCOUNT);
        assert_eq!(body["displayName"], "Mia Krystof");
        assert_eq!(body["email"], "mia@example.com");
    }

    #[tokio::test]
    async fn logout_discards_session() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        let app = build_router(test_state(&server));

        let cookie = login(&app).await;

        let response = app
            .clone()
            .oneshot(get_request("/auth/logout", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login"
        );

        let response = app
            .oneshot(get_request("/auth/me", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // ── Worklog summary ─────────────────────────────────────────────

    async fn mount_worklog_data(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issues": [{
                    "key": "PROJ-1",
                    "fields": {
                        "summary": "Fix the build",
                        "reporter": {"accountId": "rep-1", "displayName": "Reporter"}
                    }
                }]
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PROJ-1/worklog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "worklogs": [{
                    "id": "1",
                    "author": {"accountId": ACCOUNT, "displayName": "Mia Krystof"},
                    "started": "2024-01-05T09:30:00.000+0000",
                    "updated": "2024-01-05T10:00:00.000+0000",
                    "timeSpentSeconds": 3600
                }]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn api_summary_returns_day_summaries() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        mount_worklog_data(&server).await;
        let app = build_router(test_state(&server));

        let cookie = login(&app).await;

        let response = app
            .oneshot(post_json(
                "/api/v1/jira-worklogs/summary",
                &cookie,
                serde_json::json!({
                    "accountId": ACCOUNT,
                    "startDate": "2024-01-01",
                    "endDate": "2024-01-10"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response).await;
        let days = body.as_array().expect("array of day summaries");
        assert_eq!(days.len(), 1);
        assert_eq!(days[0]["workDate"], "2024-01-05");
        assert_eq!(days[0]["workDateFormatted"], "05-01-2024");
        assert_eq!(days[0]["daySummary"]["totalTimeSpentSeconds"], 3600);
        assert_eq!(days[0]["daySummary"]["totalTimeSpentFormatted"], "1h");
        let issue = &days[0]["issues"][0];
        assert_eq!(issue["issueKey"], "PROJ-1");
        assert_eq!(issue["worklogs"][0]["timeSpentFormatted"], "1h");
        assert_eq!(issue["worklogs"][0]["startedTime"], "09:30");
    }

    #[tokio::test]
    async fn api_summary_defaults_account_to_identity() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        mount_worklog_data(&server).await;
        let app = build_router(test_state(&server));

        let cookie = login(&app).await;

        let response = app
            .oneshot(post_json(
                "/api/v1/jira-worklogs/summary",
                &cookie,
                serde_json::json!({"startDate": "2024-01-01", "endDate": "2024-01-10"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn api_summary_rejects_inverted_range() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        let app = build_router(test_state(&server));

        let cookie = login(&app).await;

        let response = app
            .oneshot(post_json(
                "/api/v1/jira-worklogs/summary",
                &cookie,
                serde_json::json!({"startDate": "2024-01-10", "endDate": "2024-01-01"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("endDate"));
    }

    #[tokio::test]
    async fn ui_submit_renders_summary_html() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        mount_worklog_data(&server).await;
        let app = build_router(test_state(&server));

        let cookie = login(&app).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/ui/worklogs")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, &cookie)
            .body(Body::from(format!(
                "accountId={ACCOUNT}&startDate=2024-01-01&endDate=2024-01-10"
            )))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = read_body_string(response).await;
        assert!(html.contains("PROJ-1"), "summary table should list the issue");
        assert!(html.contains("05-01-2024"));
    }

    #[tokio::test]
    async fn ui_submit_rejects_inverted_range() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        let app = build_router(test_state(&server));

        let cookie = login(&app).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/ui/worklogs")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, &cookie)
            .body(Body::from(format!(
                "accountId={ACCOUNT}&startDate=2024-01-10&endDate=2024-01-01"
            )))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("endDate"));
    }

    #[tokio::test]
    async fn ui_form_renders_for_authenticated_session() {
        let server = MockServer::start().await;
        mount_oauth_success(&server).await;
        let app = build_router(test_state(&server));

        let cookie = login(&app).await;

        let response = app
            .oneshot(get_request("/ui/worklogs", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = read_body_string(response).await;
        assert!(html.contains("form"));
    }
}
