use crate::jira::{DateRange, IssueWorklogs, WorklogEntry};

/// Rendered when there is nothing to display
pub const NO_WORKLOGS: &str = "No worklogs found";

/// In-range worklog entries across all issues, most recent first
pub fn collect_entries(issues: &[IssueWorklogs], range: &DateRange) -> Vec<WorklogEntry> {
    let mut entries: Vec<WorklogEntry> = issues
        .iter()
        .flat_map(IssueWorklogs::entries)
        .filter(|entry| range.contains(&entry.started))
        .collect();

    entries.sort_by(|a, b| b.started.cmp(&a.started));
    entries
}

/// Render entries as `worklog-item` HTML blocks
pub fn render_html(entries: &[WorklogEntry]) -> String {
    if entries.is_empty() {
        return NO_WORKLOGS.to_string();
    }

    entries
        .iter()
        .map(|entry| {
            format!(
                "<div class=\"worklog-item\">\n  <h3>{} [{}]</h3>\n  <p>{}</p>\n</div>\n",
                escape_html(&entry.issue_key),
                entry.time_spent(),
                escape_html(&entry.comment)
            )
        })
        .collect()
}

/// Render entries for a terminal
pub fn render_text(entries: &[WorklogEntry]) -> String {
    if entries.is_empty() {
        return NO_WORKLOGS.to_string();
    }

    let mut output = String::new();
    for entry in entries {
        output.push_str(&format!(
            "{} [{}] {} - {}\n",
            entry.issue_key,
            entry.time_spent(),
            entry.started.format("%Y-%m-%d %H:%M"),
            entry.issue_summary
        ));
        for line in entry.comment.lines() {
            output.push_str(&format!("  {}\n", line));
        }
    }
    output
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::models::{Worklog, WorklogComment};
    use crate::jira::FetchStatus;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .unwrap()
    }

    fn log(day: u32, hour: u32, seconds: u64, comment: &str) -> Worklog {
        Worklog {
            started: Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap(),
            time_spent_seconds: seconds,
            comment: Some(WorklogComment::PlainText(comment.to_string())),
        }
    }

    fn issue(key: &str, worklogs: Vec<Worklog>, status: FetchStatus) -> IssueWorklogs {
        IssueWorklogs {
            key: key.to_string(),
            summary: format!("{} summary", key),
            worklogs,
            status,
        }
    }

    #[test]
    fn test_entries_sorted_most_recent_first() {
        let issues = vec![
            issue("PROJ-1", vec![log(2, 9, 600, "older")], FetchStatus::Filtered),
            issue(
                "PROJ-2",
                vec![log(5, 9, 600, "newest"), log(3, 9, 600, "middle")],
                FetchStatus::Filtered,
            ),
        ];

        let entries = collect_entries(&issues, &range());
        let comments: Vec<&str> = entries.iter().map(|e| e.comment.as_str()).collect();
        assert_eq!(comments, vec!["newest", "middle", "older"]);
    }

    #[test]
    fn test_entries_refilter_degraded_issues() {
        let issues = vec![issue(
            "PROJ-3",
            vec![log(2, 9, 600, "in range"), log(20, 9, 600, "out of range")],
            FetchStatus::Degraded {
                reason: "boom".to_string(),
            },
        )];

        let entries = collect_entries(&issues, &range());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].comment, "in range");
    }

    #[test]
    fn test_render_html() {
        let issues = vec![issue("PROJ-1", vec![log(2, 9, 3725, "Fixed <b>bug</b>")], FetchStatus::Filtered)];
        let html = render_html(&collect_entries(&issues, &range()));

        assert_eq!(html.matches("<div class=\"worklog-item\">").count(), 1);
        assert!(html.contains("<h3>PROJ-1 [1h 2m]</h3>"));
        assert!(html.contains("<p>Fixed &lt;b&gt;bug&lt;/b&gt;</p>"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_html(&[]), NO_WORKLOGS);
        assert_eq!(render_text(&[]), NO_WORKLOGS);
    }

    #[test]
    fn test_render_text() {
        let issues = vec![issue("PROJ-1", vec![log(2, 9, 5400, "Line one\nLine two")], FetchStatus::Filtered)];
        let text = render_text(&collect_entries(&issues, &range()));

        assert!(text.starts_with("PROJ-1 [1h 30m] 2024-01-02 09:00 - PROJ-1 summary\n"));
        assert!(text.contains("  Line one\n  Line two\n"));
    }
}
