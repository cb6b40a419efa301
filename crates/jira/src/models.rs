use serde::{Deserialize, Serialize};

/// A user record from the Jira Cloud REST API (`/rest/api/3/myself`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub account_id: String,
    pub email_address: Option<String>,
    pub display_name: Option<String>,
}

/// Response envelope of `/rest/api/3/search/jql`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub key: String,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    pub summary: String,
    pub reporter: Option<UserRef>,
    pub assignee: Option<UserRef>,
    #[serde(rename = "issuetype")]
    pub issue_type: Option<NamedField>,
    pub status: Option<StatusField>,
    pub priority: Option<NamedField>,
    #[serde(rename = "timeoriginalestimate")]
    pub time_original_estimate: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub account_id: Option<String>,
    pub display_name: Option<String>,
}

/// Issue type and priority share this shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedField {
    pub name: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusField {
    pub name: Option<String>,
    pub status_category: Option<StatusCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCategory {
    pub name: Option<String>,
}

/// Response envelope of `/rest/api/3/issue/{key}/worklog`.
#[derive(Debug, Deserialize)]
pub struct WorklogsResponse {
    #[serde(default)]
    pub worklogs: Vec<RawWorklog>,
}

/// A single worklog record as returned by the tracker, before aggregation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorklog {
    pub id: String,
    pub author: WorklogAuthor,
    #[serde(default)]
    pub started: String,
    #[serde(default)]
    pub updated: String,
    pub time_spent_seconds: i64,
    pub comment: Option<CommentDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogAuthor {
    pub account_id: String,
    pub display_name: Option<String>,
}

/// Atlassian document-format comment body. Only inline `text` nodes are
/// ever read; everything else (marks, mentions, links) is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentDoc {
    #[serde(default)]
    pub content: Vec<CommentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentBlock {
    #[serde(default)]
    pub content: Vec<CommentNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentNode {
    #[serde(rename = "type", default)]
    pub node_type: String,
    pub text: Option<String>,
}
