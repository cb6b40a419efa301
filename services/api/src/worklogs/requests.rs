use chrono::NaiveDate;
use serde::Deserialize;

/// JSON API body. `account_id` defaults to the authenticated identity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub account_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// UI form body. Dates stay strings; ISO form makes lexicographic
/// comparison equivalent to date comparison.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryForm {
    pub account_id: String,
    pub start_date: String,
    pub end_date: String,
}
