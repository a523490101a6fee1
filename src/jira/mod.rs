pub mod client;
pub mod fetcher;
pub mod models;

use crate::error::{RecapError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use models::{Worklog, WorklogComment};

/// Shown in place of a worklog comment with no extractable text
pub const NO_COMMENT: &str = "No comment";

/// Inclusive calendar date range for worklog filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting an end date before the start date
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(RecapError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days leading up to and including `today`
    pub fn days_back(today: NaiveDate, days: u32) -> Result<Self> {
        let start = today
            .checked_sub_signed(Duration::days(days as i64))
            .ok_or_else(|| {
                RecapError::config(format!("{} days before {} is out of range", days, today))
            })?;
        Ok(Self { start, end: today })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Change the start date. An invalid range leaves the previous value in place.
    #[allow(dead_code)]
    pub fn set_start(&mut self, start: NaiveDate) -> Result<()> {
        *self = Self::new(start, self.end)?;
        Ok(())
    }

    /// Change the end date. An invalid range leaves the previous value in place.
    #[allow(dead_code)]
    pub fn set_end(&mut self, end: NaiveDate) -> Result<()> {
        *self = Self::new(self.start, end)?;
        Ok(())
    }

    /// Midnight at the start of the first day
    pub fn start_bound(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_time(NaiveTime::default()))
    }

    /// 23:59:59.999 on the last day
    pub fn end_bound(&self) -> DateTime<Utc> {
        let next_day = Utc.from_utc_datetime(&self.end.and_time(NaiveTime::default()))
            + Duration::days(1);
        next_day - Duration::milliseconds(1)
    }

    /// Check if a timestamp is within this range (both ends inclusive)
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        ts >= &self.start_bound() && ts <= &self.end_bound()
    }

    /// Keep only the worklogs started inside this range
    pub fn filter_worklogs(&self, worklogs: &[Worklog]) -> Vec<Worklog> {
        worklogs
            .iter()
            .filter(|log| self.contains(&log.started))
            .cloned()
            .collect()
    }

    /// JQL selecting issues the current user logged work on in this range
    pub fn jql(&self) -> String {
        format!(
            "worklogAuthor = currentUser() AND worklogDate >= \"{}\" AND worklogDate <= \"{}\" ORDER BY updated DESC",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// How an issue's worklogs were obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Worklog list fetched and narrowed to the date range
    Filtered,
    /// Worklog fetch failed; worklogs are the unfiltered ones embedded in the search result
    Degraded { reason: String },
}

/// One issue together with the worklogs that will be reported
#[derive(Debug, Clone, PartialEq)]
pub struct IssueWorklogs {
    pub key: String,
    pub summary: String,
    pub worklogs: Vec<Worklog>,
    pub status: FetchStatus,
}

impl IssueWorklogs {
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, FetchStatus::Degraded { .. })
    }

    /// Flatten into display records
    pub fn entries(&self) -> Vec<WorklogEntry> {
        self.worklogs
            .iter()
            .map(|log| WorklogEntry {
                issue_key: self.key.clone(),
                issue_summary: self.summary.clone(),
                time_spent_seconds: log.time_spent_seconds,
                comment: extract_comment_text(log.comment.as_ref()),
                started: log.started,
            })
            .collect()
    }
}

/// Flattened, read-only view of a single worklog
#[derive(Debug, Clone, PartialEq)]
pub struct WorklogEntry {
    pub issue_key: String,
    pub issue_summary: String,
    pub time_spent_seconds: u64,
    pub comment: String,
    pub started: DateTime<Utc>,
}

impl WorklogEntry {
    pub fn time_spent(&self) -> String {
        format_time_spent(self.time_spent_seconds)
    }
}

/// Render seconds as `Hh Mm`, dropping leftover seconds
pub fn format_time_spent(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

/// Reduce a worklog comment to plain text
pub fn extract_comment_text(comment: Option<&WorklogComment>) -> String {
    let text = match comment {
        Some(WorklogComment::PlainText(text)) => text.clone(),
        Some(WorklogComment::RichDocument(doc)) => doc
            .content
            .iter()
            .filter(|block| block.is_paragraph())
            .map(|block| {
                block
                    .content
                    .iter()
                    .filter_map(|run| run.text.as_deref())
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|paragraph| !paragraph.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        None => String::new(),
    };

    if text.is_empty() {
        NO_COMMENT.to_string()
    } else {
        text
    }
}
