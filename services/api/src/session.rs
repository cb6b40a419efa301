use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_sessions::Session;
use worklog_common::{WorklogError, WorklogResult};
use worklog_jira::models::JiraUser;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_INFO_KEY: &str = "user_info";
pub const OAUTH_STATE_KEY: &str = "oauth_state";

/// Key/value façade over the per-request session. No validation or TTL
/// logic of its own; expiry belongs to the cookie transport.
pub struct SessionData {
    session: Session,
}

impl SessionData {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub async fn access_token(&self) -> WorklogResult<Option<String>> {
        self.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn set_access_token(&self, token: &str) -> WorklogResult<()> {
        self.set(ACCESS_TOKEN_KEY, &token).await
    }

    pub async fn refresh_token(&self) -> WorklogResult<Option<String>> {
        self.get(REFRESH_TOKEN_KEY).await
    }

    pub async fn set_refresh_token(&self, token: &str) -> WorklogResult<()> {
        self.set(REFRESH_TOKEN_KEY, &token).await
    }

    pub async fn user_info(&self) -> WorklogResult<Option<JiraUser>> {
        self.get(USER_INFO_KEY).await
    }

    pub async fn set_user_info(&self, user: &JiraUser) -> WorklogResult<()> {
        self.set(USER_INFO_KEY, user).await
    }

    pub async fn oauth_state(&self) -> WorklogResult<Option<String>> {
        self.get(OAUTH_STATE_KEY).await
    }

    pub async fn set_oauth_state(&self, state: &str) -> WorklogResult<()> {
        self.set(OAUTH_STATE_KEY, &state).await
    }

    pub async fn remove_oauth_state(&self) -> WorklogResult<()> {
        self.session
            .remove::<String>(OAUTH_STATE_KEY)
            .await
            .map(|_| ())
            .map_err(store_error)
    }

    /// Discard the whole session: tokens, cached profile, pending state.
    pub async fn clear(&self) -> WorklogResult<()> {
        self.session.flush().await.map_err(store_error)
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> WorklogResult<Option<T>> {
        self.session.get(key).await.map_err(store_error)
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T) -> WorklogResult<()> {
        self.session.insert(key, value).await.map_err(store_error)
    }
}

fn store_error(err: tower_sessions::session::Error) -> WorklogError {
    WorklogError::Internal(format!("session store error: {err}"))
}
