pub mod aggregate;
pub mod client;
pub mod format;
pub mod models;
pub mod oauth;
pub mod query;

pub use aggregate::{aggregate, DaySummary, IssueSummary, WorklogEntry};
pub use client::{Credential, JiraClient, JiraClientError};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse};
