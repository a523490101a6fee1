use crate::error::{RecapError, Result};
use crate::jira::client::JiraClient;
use crate::jira::models::SearchIssue;
use crate::jira::{DateRange, FetchStatus, IssueWorklogs};
use futures::future::join_all;

/// Collects the current user's worklogs for a date range
pub struct WorklogFetcher {
    client: JiraClient,
}

impl WorklogFetcher {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    /// Fetch issues and their in-range worklogs.
    ///
    /// A failed search aborts the whole fetch. A failed per-issue worklog
    /// request only degrades that issue: it is kept with the worklogs the
    /// search embedded, unfiltered.
    pub async fn fetch(&self, range: &DateRange) -> Result<Vec<IssueWorklogs>> {
        let search = self
            .client
            .search_worklog_issues(range)
            .await
            .map_err(RecapError::fetch_failed)?;

        if search.issues.is_empty() {
            tracing::info!("no issues with worklogs in range");
            return Ok(Vec::new());
        }

        tracing::info!(
            base_url = self.client.base_url(),
            count = search.issues.len(),
            total = ?search.total,
            "fetching issue worklogs"
        );

        let outcomes = join_all(
            search
                .issues
                .into_iter()
                .map(|issue| self.fetch_issue(issue, range)),
        )
        .await;

        let issues: Vec<IssueWorklogs> = outcomes
            .into_iter()
            .filter(|issue| issue.is_degraded() || !issue.worklogs.is_empty())
            .collect();

        Ok(issues)
    }

    async fn fetch_issue(&self, issue: SearchIssue, range: &DateRange) -> IssueWorklogs {
        match self.client.issue_worklogs(&issue.key).await {
            Ok(page) => {
                if let Some(total) = page.total {
                    if total > page.worklogs.len() as u64 {
                        tracing::debug!(
                            issue = %issue.key,
                            total,
                            returned = page.worklogs.len(),
                            "worklog page truncated"
                        );
                    }
                }
                IssueWorklogs {
                    key: issue.key,
                    summary: issue.fields.summary,
                    worklogs: range.filter_worklogs(&page.worklogs),
                    status: FetchStatus::Filtered,
                }
            }
            Err(err) => {
                tracing::warn!(issue = %issue.key, error = %err, "failed to fetch worklog for issue");
                IssueWorklogs {
                    key: issue.key,
                    summary: issue.fields.summary,
                    worklogs: issue
                        .fields
                        .worklog
                        .map(|page| page.worklogs)
                        .unwrap_or_default(),
                    status: FetchStatus::Degraded {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Account;
    use chrono::NaiveDate;
    use mockito::{Matcher, Server};

    fn test_account(url: &str) -> Account {
        Account {
            id: "1704067200000".to_string(),
            name: "Work".to_string(),
            email: "dev@example.com".to_string(),
            token: "jira-token".to_string(),
            jira_url: url.to_string(),
        }
    }

    fn test_range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .unwrap()
    }

    fn fetcher_for(server: &Server) -> WorklogFetcher {
        let client = JiraClient::new(&test_account(&server.url()), None).unwrap();
        WorklogFetcher::new(client)
    }

    async fn mock_search(server: &mut Server, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/rest/api/3/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_worklogs(server: &mut Server, key: &str, status: usize, body: &str) -> mockito::Mock {
        server
            .mock("GET", format!("/rest/api/3/issue/{}/worklog", key).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_fetch_no_issues_is_empty() {
        let mut server = Server::new_async().await;
        let _search = mock_search(&mut server, r#"{"total": 0, "issues": []}"#).await;

        let issues = fetcher_for(&server).fetch(&test_range()).await.unwrap();
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_filters_worklogs_to_range() {
        let mut server = Server::new_async().await;
        let _search = mock_search(
            &mut server,
            r#"{"issues": [{"key": "PROJ-1", "fields": {"summary": "Login page"}}]}"#,
        )
        .await;
        let _logs = mock_worklogs(
            &mut server,
            "PROJ-1",
            200,
            r#"{"worklogs": [
                {"id": "1", "started": "2024-01-03T10:00:00.000+0000", "timeSpentSeconds": 3600, "comment": "Inside"},
                {"id": "2", "started": "2024-01-09T10:00:00.000+0000", "timeSpentSeconds": 1800, "comment": "Outside"}
            ]}"#,
        )
        .await;

        let range = test_range();
        let issues = fetcher_for(&server).fetch(&range).await.unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "PROJ-1");
        assert_eq!(issues[0].status, FetchStatus::Filtered);
        assert_eq!(issues[0].worklogs.len(), 1);
        assert!(range.contains(&issues[0].worklogs[0].started));
    }

    #[tokio::test]
    async fn test_fetch_drops_issues_without_in_range_worklogs() {
        let mut server = Server::new_async().await;
        let _search = mock_search(
            &mut server,
            r#"{"issues": [
                {"key": "PROJ-1", "fields": {"summary": "Kept"}},
                {"key": "PROJ-2", "fields": {"summary": "Dropped"}}
            ]}"#,
        )
        .await;
        let _keep = mock_worklogs(
            &mut server,
            "PROJ-1",
            200,
            r#"{"worklogs": [{"started": "2024-01-02T08:00:00.000+0000", "timeSpentSeconds": 600}]}"#,
        )
        .await;
        let _drop = mock_worklogs(
            &mut server,
            "PROJ-2",
            200,
            r#"{"worklogs": [{"started": "2023-12-01T08:00:00.000+0000", "timeSpentSeconds": 600}]}"#,
        )
        .await;

        let issues = fetcher_for(&server).fetch(&test_range()).await.unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "PROJ-1");
    }

    #[tokio::test]
    async fn test_fetch_tolerates_single_issue_failure() {
        let mut server = Server::new_async().await;
        let _search = mock_search(
            &mut server,
            r#"{"issues": [
                {"key": "PROJ-1", "fields": {"summary": "One"}},
                {"key": "PROJ-2", "fields": {"summary": "Two"}},
                {"key": "PROJ-3", "fields": {"summary": "Three", "worklog": {"worklogs": [
                    {"started": "2023-11-20T08:00:00.000+0000", "timeSpentSeconds": 900, "comment": "Old"}
                ]}}},
                {"key": "PROJ-4", "fields": {"summary": "Four"}}
            ]}"#,
        )
        .await;
        let in_range = r#"{"worklogs": [{"started": "2024-01-05T08:00:00.000+0000", "timeSpentSeconds": 600}]}"#;
        let _one = mock_worklogs(&mut server, "PROJ-1", 200, in_range).await;
        let _two = mock_worklogs(&mut server, "PROJ-2", 200, in_range).await;
        let _three = mock_worklogs(&mut server, "PROJ-3", 500, r#"{"message": "boom"}"#).await;
        let _four = mock_worklogs(&mut server, "PROJ-4", 200, in_range).await;

        let issues = fetcher_for(&server).fetch(&test_range()).await.unwrap();

        assert_eq!(issues.len(), 4);
        let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["PROJ-1", "PROJ-2", "PROJ-3", "PROJ-4"]);

        let degraded = &issues[2];
        assert!(degraded.is_degraded());
        assert_eq!(degraded.summary, "Three");
        // Embedded worklog kept as-is, even though it is out of range
        assert_eq!(degraded.worklogs.len(), 1);
        assert_eq!(degraded.worklogs[0].time_spent_seconds, 900);
    }

    #[tokio::test]
    async fn test_fetch_search_failure_aborts() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/rest/api/3/search")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"message": "Forbidden for this user"}"#)
            .create_async()
            .await;

        let err = fetcher_for(&server).fetch(&test_range()).await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(
            err.to_string(),
            "Failed to fetch worklogs: Tracker request failed (403): Forbidden for this user"
        );
    }
}
