use reqwest::{header, Client, RequestBuilder, StatusCode};

use crate::models::{Issue, JiraUser, RawWorklog, SearchResponse, WorklogsResponse};
use crate::query::build_worklog_author_jql;

/// Fields requested alongside each issue in the search.
const SEARCH_FIELDS: &str = "summary,reporter,issuetype,status,priority,assignee,timeoriginalestimate";

/// Search result cap. No follow-up pages are requested; accounts with more
/// than 100 matching issues are truncated.
const MAX_RESULTS: &str = "100";

/// Credential for tracker API calls. Chosen once per request by the caller,
/// never inferred inside the client.
#[derive(Debug, Clone)]
pub enum Credential {
    Basic { email: String, api_token: String },
    Bearer { access_token: String },
}

impl Credential {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::Basic { email, api_token } => request.basic_auth(email, Some(api_token)),
            Credential::Bearer { access_token } => request.bearer_auth(access_token),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JiraClientError {
    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    base_url: String,
}

impl JiraClient {
    /// `base_url` is the tracker root, e.g. `https://acme.atlassian.net`.
    ///
    /// Calls run without timeout or retry; a stalled tracker call stalls
    /// the whole request.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Search issues that carry worklogs authored by `account_id`.
    ///
    /// Single page of at most 100 results.
    pub async fn search_issues(
        &self,
        account_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Issue>, JiraClientError> {
        let jql = build_worklog_author_jql(account_id);
        let url = format!("{}/rest/api/3/search/jql", self.base_url);

        let request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&[
                ("jql", jql.as_str()),
                ("fields", SEARCH_FIELDS),
                ("startAt", "0"),
                ("maxResults", MAX_RESULTS),
            ]);

        let response: SearchResponse = self.send(credential.apply(request)).await?;
        Ok(response.issues)
    }

    /// Fetch every worklog of one issue. One round trip per issue key.
    pub async fn get_issue_worklogs(
        &self,
        issue_key: &str,
        credential: &Credential,
    ) -> Result<Vec<RawWorklog>, JiraClientError> {
        let url = format!("{}/rest/api/3/issue/{issue_key}/worklog", self.base_url);
        let request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json");

        let response: WorklogsResponse = self.send(credential.apply(request)).await?;
        Ok(response.worklogs)
    }

    /// Fetch the profile of the user the credential belongs to.
    pub async fn get_myself(&self, credential: &Credential) -> Result<JiraUser, JiraClientError> {
        let url = format!("{}/rest/api/3/myself", self.base_url);
        let request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json");

        self.send(credential.apply(request)).await
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, JiraClientError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JiraClientError::Http { status, body });
        }

        response.json::<T>().await.map_err(JiraClientError::from)
    }
}
