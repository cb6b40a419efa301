use worklog_common::WorklogResult;
use worklog_jira::client::{Credential, JiraClient};
use worklog_jira::models::JiraUser;
use worklog_jira::oauth::OAuthClient;

use crate::session::SessionData;

pub const SESSION_EXPIRED: &str = "session expired, login again";
pub const NOT_AUTHENTICATED: &str = "not authenticated";

#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub account_id: String,
    pub display_name: String,
    pub email: String,
    /// Bearer token for downstream tracker calls.
    pub access_token: String,
}

/// Per-request identity resolution result. Callers match explicitly:
/// the UI redirects to the login page, the API answers 401.
#[derive(Debug)]
pub enum Identity {
    Authenticated(AuthenticatedIdentity),
    Unauthenticated { reason: String },
}

fn make_identity(user: JiraUser, access_token: String) -> AuthenticatedIdentity {
    AuthenticatedIdentity {
        account_id: user.account_id,
        display_name: user.display_name.unwrap_or_default(),
        email: user.email_address.unwrap_or_default(),
        access_token,
    }
}

/// Resolve the session's identity.
///
/// A cached profile short-circuits; otherwise the profile is fetched with
/// the session's access token. On fetch failure a present refresh token is
/// exchanged once and the fetch retried; a second failure, or no refresh
/// token, resolves to `Unauthenticated`. Stored tokens are never cleared
/// here — only logout discards the session.
pub async fn current_identity(
    jira: &JiraClient,
    oauth: &OAuthClient,
    session: &SessionData,
) -> WorklogResult<Identity> {
    let Some(access_token) = session.access_token().await? else {
        return Ok(Identity::Unauthenticated {
            reason: NOT_AUTHENTICATED.to_string(),
        });
    };

    if let Some(user) = session.user_info().await? {
        return Ok(Identity::Authenticated(make_identity(user, access_token)));
    }

    let credential = Credential::Bearer {
        access_token: access_token.clone(),
    };
    let fetch_error = match jira.get_myself(&credential).await {
        Ok(user) => {
            session.set_user_info(&user).await?;
            return Ok(Identity::Authenticated(make_identity(user, access_token)));
        }
        Err(e) => e,
    };

    tracing::warn!(error = %fetch_error, "profile fetch failed, attempting token refresh");

    let Some(refresh_token) = session.refresh_token().await? else {
        return Ok(Identity::Unauthenticated {
            reason: SESSION_EXPIRED.to_string(),
        });
    };

    let tokens = match oauth.refresh_access_token(&refresh_token).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(error = %e, "token refresh failed");
            return Ok(Identity::Unauthenticated {
                reason: SESSION_EXPIRED.to_string(),
            });
        }
    };

    let Some(new_access_token) = tokens.access_token else {
        return Ok(Identity::Unauthenticated {
            reason: SESSION_EXPIRED.to_string(),
        });
    };

    session.set_access_token(&new_access_token).await?;
    if let Some(new_refresh_token) = tokens.refresh_token {
        session.set_refresh_token(&new_refresh_token).await?;
    }

    let credential = Credential::Bearer {
        access_token: new_access_token.clone(),
    };
    match jira.get_myself(&credential).await {
        Ok(user) => {
            session.set_user_info(&user).await?;
            Ok(Identity::Authenticated(make_identity(user, new_access_token)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "profile fetch failed after refresh");
            Ok(Identity::Unauthenticated {
                reason: SESSION_EXPIRED.to_string(),
            })
        }
    }
}
