use crate::jira::{extract_comment_text, format_time_spent, IssueWorklogs};
use crate::report::{ReportLanguage, ReportLength, ReportStyle};
use serde::Serialize;

/// System message sent ahead of every report prompt
pub const SYSTEM_INSTRUCTION: &str =
    "You are a professional resume writer helping to summarize work activities.";

/// Bullet marker the model is told to use
pub const BULLET: char = '*';

/// Shape and size of a report for one length category
struct LengthGuide {
    format: &'static str,
    max_length: &'static str,
    structure: &'static [&'static str],
}

fn length_guide(length: ReportLength) -> LengthGuide {
    match length {
        ReportLength::Small => LengthGuide {
            format: "Create a concise weekly report summary",
            max_length: "150 words",
            structure: &["Key accomplishments", "Time allocation", "Challenges"],
        },
        ReportLength::Medium => LengthGuide {
            format: "Create a detailed weekly status report",
            max_length: "300 words",
            structure: &[
                "Overall progress",
                "Tasks by category",
                "Time allocation",
                "Challenges and solutions",
                "Next steps",
            ],
        },
        ReportLength::Long => LengthGuide {
            format: "Create a comprehensive progress report",
            max_length: "500 words",
            structure: &[
                "Executive summary",
                "Detailed tasks breakdown",
                "Time investment",
                "Technical details",
                "Ongoing work status",
                "Dependencies",
                "Risks and mitigations",
            ],
        },
    }
}

fn style_guide(style: ReportStyle) -> &'static str {
    match style {
        ReportStyle::Professional => "Use formal business language with clear, concise statements",
        ReportStyle::Casual => "Use a conversational tone while maintaining professionalism",
        ReportStyle::Technical => "Include technical details and specific terminology",
    }
}

fn language_instruction(language: ReportLanguage) -> &'static str {
    match language {
        ReportLanguage::English => "Write the response in English.",
        ReportLanguage::Indonesian => {
            "Write the response in Bahasa Indonesia using formal business language."
        }
    }
}

#[derive(Debug, Serialize)]
struct IssueDigest<'a> {
    key: &'a str,
    summary: &'a str,
    worklogs: Vec<WorklogDigest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogDigest {
    time_spent: String,
    comment: String,
    started: String,
}

/// Serialize issues into the pretty JSON block embedded in the prompt
fn serialize_activities(issues: &[IssueWorklogs]) -> String {
    let digest: Vec<IssueDigest> = issues
        .iter()
        .map(|issue| IssueDigest {
            key: &issue.key,
            summary: &issue.summary,
            worklogs: issue
                .worklogs
                .iter()
                .map(|log| WorklogDigest {
                    time_spent: format_time_spent(log.time_spent_seconds),
                    comment: extract_comment_text(log.comment.as_ref()),
                    started: log.started.format("%Y-%m-%d").to_string(),
                })
                .collect(),
        })
        .collect();

    // Plain strings and vectors cannot fail to serialize
    serde_json::to_string_pretty(&digest).unwrap_or_else(|_| "[]".to_string())
}

/// Build the report prompt from fetched worklogs
pub fn build_report_prompt(
    issues: &[IssueWorklogs],
    length: ReportLength,
    style: ReportStyle,
    language: ReportLanguage,
) -> String {
    let guide = length_guide(length);
    let mut prompt = String::new();

    prompt.push_str(
        "As a technical team member reporting to their manager, create a status report following these guidelines:\n\n",
    );

    prompt.push_str(&format!("Format: {}\n", guide.format));
    prompt.push_str(&format!("Maximum Length: {}\n", guide.max_length));
    prompt.push_str(&format!("Language: {}\n", language_instruction(language)));
    prompt.push_str(&format!("Writing Style: {}\n", style_guide(style)));
    prompt.push_str("Structure:\n");
    for section in guide.structure {
        prompt.push_str(&format!("  {} {}\n", BULLET, section));
    }

    prompt.push_str("\nWork Activities to Report:\n");
    prompt.push_str(&serialize_activities(issues));
    prompt.push_str("\n\n");

    prompt.push_str("Important:\n");
    prompt.push_str("- Group related tasks together\n");
    prompt.push_str("- Include time spent on each major area\n");
    prompt.push_str("- Highlight specific accomplishments\n");
    prompt.push_str("- Note any challenges encountered\n");
    prompt.push_str("- Keep technical details clear\n");
    prompt.push_str("- Focus on value delivered\n");
    prompt.push_str("- Include specific metrics where available\n\n");

    prompt.push_str("Format the response with clear sections:\n\n");
    prompt.push_str("OVERVIEW:\n");
    prompt.push_str("[Period accomplishments summary]\n\n");
    prompt.push_str("TASKS AND DETAILS:\n");
    prompt.push_str("[Tasks breakdown from worklogs comments]\n\n");
    prompt.push_str("CHALLENGES:\n");
    prompt.push_str("[Issues and solutions]\n\n");
    prompt.push_str("NEXT STEPS:\n");
    prompt.push_str("[Upcoming priorities]\n\n");
    prompt.push_str(&format!(
        "Use asterisks ({}) for bullet points. Don't use any other formatting. Use spacing and line breaks for readability.\n",
        BULLET
    ));

    prompt
}
