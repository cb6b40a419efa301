use serde::Deserialize;
use std::env;
use worklog_common::{WorklogError, WorklogResult};

/// Signed session cookies need a key of at least this many bytes.
const MIN_SESSION_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jira_domain: String,
    pub jira_email: String,
    pub jira_api_token: String,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    pub oauth_redirect_uri: String,
    pub oauth_authorize_url: String,
    pub oauth_token_url: String,
    pub session_secret: String,
    pub template_path: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads required vars.
    ///
    /// The basic-auth pair (`JIRA_EMAIL` / `JIRA_API_TOKEN`) is the fallback
    /// credential for the tracker API and is required at startup.
    pub fn from_env() -> WorklogResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let session_secret = get_var("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(WorklogError::Config(format!(
                "SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes, got {}",
                session_secret.len()
            )));
        }

        Ok(Self {
            jira_domain: get_var("JIRA_DOMAIN")?,
            jira_email: get_var("JIRA_EMAIL")?,
            jira_api_token: get_var("JIRA_API_TOKEN")?,
            oauth_client_id: get_var("JIRA_OAUTH_CLIENT_ID")?,
            oauth_client_secret: get_var("JIRA_OAUTH_CLIENT_SECRET")?,
            oauth_redirect_uri: get_var("JIRA_OAUTH_REDIRECT_URI")?,
            oauth_authorize_url: get_var("JIRA_OAUTH_AUTHORIZE_URL")?,
            oauth_token_url: get_var("JIRA_OAUTH_TOKEN_URL")?,
            session_secret,
            template_path: get_var_or("TEMPLATE_PATH", "templates"),
            host: get_var_or("HOST", "0.0.0.0"),
            port: get_var_or("PORT", "8000")
                .parse()
                .map_err(|e| WorklogError::Config(format!("invalid PORT: {e}")))?,
            log_level: get_var_or("LOG_LEVEL", "info"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL of the tracker's REST API, e.g. `https://acme.atlassian.net`.
    pub fn jira_base_url(&self) -> String {
        format!("https://{}", self.jira_domain)
    }
}

fn get_var(key: &str) -> WorklogResult<String> {
    env::var(key).map_err(|_| WorklogError::Config(format!("{key} is required but not set")))
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
