/// Build the JQL query for issues carrying worklogs by the given author.
///
/// No `worklogDate` clause is emitted; the date window is applied
/// client-side after the per-issue worklog fetch, so issues whose worklogs
/// all fall outside the window are still fetched in full.
pub fn build_worklog_author_jql(account_id: &str) -> String {
    format!("worklogAuthor = {}", quote_jql_value(account_id))
}

/// Quote a JQL value, escaping embedded backslashes and quotes.
/// Account ids contain `:`; they must always be quoted.
fn quote_jql_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
