use crate::error::{RecapError, Result};
use crate::jira::models::{ErrorBody, SearchResponse, WorklogPage};
use crate::jira::DateRange;
use crate::store::Account;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const SEARCH_PATH: &str = "/rest/api/3/search";
const SEARCH_FIELDS: &str = "summary,worklog";
/// Upper bound on issues considered per report
pub const MAX_RESULTS: u32 = 100;

/// Jira Cloud REST client bound to a single account
#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    base_url: String,
    email: String,
    token: String,
}

impl JiraClient {
    /// Create a client for the given account
    pub fn new(account: &Account, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-atlassian-token"),
            HeaderValue::from_static("no-check"),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: account.jira_url.trim_end_matches('/').to_string(),
            email: account.email.clone(),
            token: account.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search issues the current user logged work on within `range`
    pub async fn search_worklog_issues(&self, range: &DateRange) -> Result<SearchResponse> {
        let jql = range.jql();
        let max_results = MAX_RESULTS.to_string();
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        tracing::debug!(%url, %jql, "searching issues");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.email, Some(&self.token))
            .query(&[
                ("jql", jql.as_str()),
                ("fields", SEARCH_FIELDS),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await?;

        Self::parse_json(response).await
    }

    /// Fetch the full worklog list of one issue
    pub async fn issue_worklogs(&self, issue_key: &str) -> Result<WorklogPage> {
        let url = format!("{}/rest/api/3/issue/{}/worklog", self.base_url, issue_key);
        tracing::debug!(%url, "fetching worklogs");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.email, Some(&self.token))
            .send()
            .await?;

        Self::parse_json(response).await
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|err| err.first_message().map(String::from))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        Err(RecapError::Tracker {
            status: status.as_u16(),
            message,
        })
    }
}
