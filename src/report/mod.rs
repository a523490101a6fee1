pub mod format;
pub mod openrouter;
pub mod prompt;

use crate::jira::{DateRange, IssueWorklogs, WorklogEntry};
use crate::store::Account;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target size of the generated report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportLength {
    Small,
    #[default]
    Medium,
    Long,
}

/// Tone of the generated report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    #[default]
    Professional,
    Casual,
    Technical,
}

/// Language the report is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum ReportLanguage {
    #[default]
    #[serde(rename = "en")]
    #[value(name = "en")]
    English,
    #[serde(rename = "id")]
    #[value(name = "id")]
    Indonesian,
}

impl fmt::Display for ReportLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Long => "long",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ReportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Technical => "technical",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ReportLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::English => "English",
            Self::Indonesian => "Indonesian",
        };
        f.write_str(name)
    }
}

/// Everything needed for one report generation
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub range: DateRange,
    pub account: Account,
    pub length: ReportLength,
    pub style: ReportStyle,
    pub language: ReportLanguage,
}

/// Result of one report generation
#[derive(Debug, Clone)]
pub struct Report {
    /// Generated narrative, or the generation error text
    pub text: String,
    /// Issues and worklogs the report was built from
    pub issues: Vec<IssueWorklogs>,
    /// In-range worklogs, most recent first
    pub entries: Vec<WorklogEntry>,
    /// When this report was generated
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn new(text: String, issues: Vec<IssueWorklogs>, entries: Vec<WorklogEntry>) -> Self {
        Self {
            text,
            issues,
            entries,
            generated_at: Utc::now(),
        }
    }

    /// Total logged seconds across displayed entries
    pub fn total_seconds(&self) -> u64 {
        self.entries.iter().map(|entry| entry.time_spent_seconds).sum()
    }

    pub fn degraded_issue_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_degraded()).count()
    }
}
