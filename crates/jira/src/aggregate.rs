use std::collections::BTreeMap;

use serde::Serialize;
use worklog_common::{WorklogError, WorklogResult};

use crate::client::{Credential, JiraClient};
use crate::format::{extract_comment, format_seconds, format_updated, format_work_date, started_time};
use crate::models::{Issue, RawWorklog};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonInfo {
    pub account_id: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub name: String,
    pub status_category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSummary {
    pub total_time_spent_seconds: i64,
    pub total_time_spent_formatted: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAuthor {
    pub account_id: String,
    pub display_name: String,
}

/// One logged unit of time, fully presentation-ready.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogEntry {
    pub worklog_id: String,
    pub comment: String,
    pub time_spent_seconds: i64,
    pub time_spent_formatted: String,
    pub started: String,
    pub started_date: String,
    pub started_time: String,
    pub updated: String,
    pub updated_formatted: String,
    pub author: EntryAuthor,
}

/// All worklogs of one issue within one day.
/// Invariant: `worklog_summary` total equals the sum of entry seconds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub issue_key: String,
    pub issue_summary: String,
    pub reported_by: PersonInfo,
    pub assignee: PersonInfo,
    pub issue_type: TypeInfo,
    pub status: StatusInfo,
    pub priority: TypeInfo,
    pub original_estimate: Option<i64>,
    pub original_estimate_formatted: Option<String>,
    pub worklog_summary: TotalSummary,
    pub worklogs: Vec<WorklogEntry>,
}

/// One calendar day of the aggregation.
/// Invariant: `day_summary` total equals the sum of issue totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub work_date: String,
    pub work_date_formatted: String,
    pub day_summary: TotalSummary,
    pub issues: Vec<IssueSummary>,
}

impl WorklogEntry {
    fn from_raw(raw: &RawWorklog) -> Self {
        Self {
            worklog_id: raw.id.clone(),
            comment: extract_comment(raw.comment.as_ref()),
            time_spent_seconds: raw.time_spent_seconds,
            time_spent_formatted: format_seconds(raw.time_spent_seconds),
            started: raw.started.clone(),
            started_date: raw.started.get(..10).unwrap_or_default().to_string(),
            started_time: started_time(&raw.started),
            updated: raw.updated.clone(),
            updated_formatted: format_updated(&raw.updated),
            author: EntryAuthor {
                account_id: raw.author.account_id.clone(),
                display_name: raw
                    .author
                    .display_name
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            },
        }
    }
}

impl IssueSummary {
    fn from_issue(issue: &Issue) -> Self {
        let fields = &issue.fields;

        let person = |user: Option<&crate::models::UserRef>, fallback: &str| PersonInfo {
            account_id: user.and_then(|u| u.account_id.clone()),
            display_name: user
                .and_then(|u| u.display_name.clone())
                .unwrap_or_else(|| fallback.to_string()),
        };

        let named = |field: Option<&crate::models::NamedField>| TypeInfo {
            name: field
                .and_then(|f| f.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            icon_url: field.and_then(|f| f.icon_url.clone()),
        };

        let estimate = fields.time_original_estimate;

        Self {
            issue_key: issue.key.clone(),
            issue_summary: fields.summary.clone(),
            reported_by: person(fields.reporter.as_ref(), "Unknown"),
            assignee: person(fields.assignee.as_ref(), "Unassigned"),
            issue_type: named(fields.issue_type.as_ref()),
            status: StatusInfo {
                name: fields
                    .status
                    .as_ref()
                    .and_then(|s| s.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                status_category: fields
                    .status
                    .as_ref()
                    .and_then(|s| s.status_category.as_ref())
                    .and_then(|c| c.name.clone()),
            },
            priority: named(fields.priority.as_ref()),
            original_estimate: estimate,
            original_estimate_formatted: estimate.filter(|&s| s != 0).map(format_seconds),
            worklog_summary: TotalSummary {
                total_time_spent_seconds: 0,
                total_time_spent_formatted: String::new(),
            },
            worklogs: Vec::new(),
        }
    }
}

impl DaySummary {
    fn new(work_date: &str) -> Self {
        Self {
            work_date: work_date.to_string(),
            work_date_formatted: format_work_date(work_date),
            day_summary: TotalSummary {
                total_time_spent_seconds: 0,
                total_time_spent_formatted: String::new(),
            },
            issues: Vec::new(),
        }
    }

    /// Find-or-insert preserving first-seen issue order within the day.
    fn issue_entry(&mut self, issue: &Issue) -> &mut IssueSummary {
        if let Some(pos) = self.issues.iter().position(|i| i.issue_key == issue.key) {
            &mut self.issues[pos]
        } else {
            self.issues.push(IssueSummary::from_issue(issue));
            let last = self.issues.len() - 1;
            &mut self.issues[last]
        }
    }
}

/// Fold a user's worklogs in `[start_date, end_date]` (inclusive, ISO date
/// strings) into per-day, per-issue summaries, sorted ascending by date.
///
/// Issues are searched once, then worklogs fetched per issue — O(issues)
/// sequential round trips. A failed per-issue worklog fetch is logged and
/// that issue skipped; the remaining issues still aggregate.
pub async fn aggregate(
    client: &JiraClient,
    credential: &Credential,
    account_id: &str,
    start_date: &str,
    end_date: &str,
) -> WorklogResult<Vec<DaySummary>> {
    let issues = client
        .search_issues(account_id, credential)
        .await
        .map_err(|e| WorklogError::ExternalService(format!("issue search failed: {e}")))?;

    tracing::debug!(count = issues.len(), account_id, "issue search returned");

    let mut days: BTreeMap<String, DaySummary> = BTreeMap::new();

    for issue in &issues {
        let worklogs = match client.get_issue_worklogs(&issue.key, credential).await {
            Ok(worklogs) => worklogs,
            Err(e) => {
                tracing::warn!(
                    issue_key = %issue.key,
                    error = %e,
                    "failed to fetch worklogs, skipping issue"
                );
                continue;
            }
        };

        for raw in &worklogs {
            if raw.author.account_id != account_id {
                continue;
            }

            // Calendar-date component of the start timestamp; lexicographic
            // comparison on YYYY-MM-DD matches date order.
            let Some(worklog_date) = raw.started.get(..10) else {
                continue;
            };
            if worklog_date < start_date || worklog_date > end_date {
                continue;
            }

            let day = days
                .entry(worklog_date.to_string())
                .or_insert_with(|| DaySummary::new(worklog_date));

            let entry = WorklogEntry::from_raw(raw);
            let seconds = entry.time_spent_seconds;

            let issue_entry = day.issue_entry(issue);
            issue_entry.worklogs.push(entry);
            issue_entry.worklog_summary.total_time_spent_seconds += seconds;
            day.day_summary.total_time_spent_seconds += seconds;
        }
    }

    let mut result: Vec<DaySummary> = days.into_values().collect();
    for day in &mut result {
        for issue in &mut day.issues {
            issue.worklog_summary.total_time_spent_formatted =
                format_seconds(issue.worklog_summary.total_time_spent_seconds);
        }
        day.day_summary.total_time_spent_formatted =
            format_seconds(day.day_summary.total_time_spent_seconds);
    }

    Ok(result)
}
