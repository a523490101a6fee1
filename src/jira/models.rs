use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer};

/// Jira timestamps look like `2024-01-03T10:00:00.000+0000`
const JIRA_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Response of `GET /rest/api/3/search`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<SearchIssue>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Issue as returned by the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssue {
    pub key: String,
    #[serde(default)]
    pub fields: SearchIssueFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchIssueFields {
    #[serde(default)]
    pub summary: String,
    /// First page of worklogs embedded by `fields=worklog`
    #[serde(default)]
    pub worklog: Option<WorklogPage>,
}

/// Response of `GET /rest/api/3/issue/{key}/worklog`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogPage {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub worklogs: Vec<Worklog>,
}

/// A single time-tracking record against an issue
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worklog {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub time_spent_seconds: u64,
    #[serde(default)]
    pub comment: Option<WorklogComment>,
}

/// Worklog comment, either legacy plain text or an Atlassian Document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WorklogComment {
    PlainText(String),
    RichDocument(Document),
}

/// Root of an Atlassian Document Format tree
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub content: Vec<DocumentNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentNode {
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn is_paragraph(&self) -> bool {
        self.node_type == "paragraph"
    }
}

/// Error body Jira returns alongside non-success statuses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_messages: Vec<String>,
}

impl ErrorBody {
    pub fn first_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or_else(|| self.error_messages.first().map(String::as_str))
    }
}

/// Parse a Jira timestamp, falling back to RFC 3339
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_str(value, JIRA_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid worklog timestamp: {}", raw)))
}
