use crate::report::{ReportLanguage, ReportLength, ReportStyle};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "worklog-recap")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "AI-powered status reports from your Jira worklogs",
    long_about = "worklog-recap collects the worklogs you recorded in Jira over a date range \
                  and turns them into a narrative status report using a text-generation model \
                  served through OpenRouter."
)]
pub struct Cli {
    /// Account id or name to report on (default: last used account)
    #[arg(short, long)]
    pub account: Option<String>,

    /// Number of days to look back
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Start date (YYYY-MM-DD format)
    #[arg(long)]
    pub since: Option<NaiveDate>,

    /// End date (YYYY-MM-DD format)
    #[arg(long)]
    pub until: Option<NaiveDate>,

    /// Report length
    #[arg(short, long, value_enum)]
    pub length: Option<ReportLength>,

    /// Writing style
    #[arg(short, long, value_enum)]
    pub style: Option<ReportStyle>,

    /// Report language
    #[arg(long, value_enum)]
    pub language: Option<ReportLanguage>,

    /// Path to config file (default: ~/.config/worklog-recap/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Account store directory (default: ~/.local/share/worklog-recap)
    #[arg(long, value_name = "DIR", env = "WORKLOG_RECAP_STORE")]
    pub store: Option<PathBuf>,

    /// Output file path for the report text
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also print the raw worklog entries
    #[arg(long)]
    pub raw: bool,

    /// Print raw worklog entries as HTML blocks
    #[arg(long, requires = "raw")]
    pub html: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Manage Jira accounts
    #[command(subcommand)]
    Account(AccountCommand),

    /// Manage the OpenRouter API key
    #[command(subcommand)]
    ApiKey(ApiKeyCommand),
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Add a Jira account
    Add(AddAccountArgs),

    /// List configured accounts
    List,

    /// Delete an account by id
    Delete {
        /// Account id as shown by `account list`
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct AddAccountArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Atlassian account email
    #[arg(long)]
    pub email: String,

    /// Jira API token
    #[arg(long, env = "JIRA_API_TOKEN")]
    pub token: String,

    /// Jira site URL, e.g. https://acme.atlassian.net
    #[arg(long)]
    pub url: String,
}

#[derive(Subcommand, Debug)]
pub enum ApiKeyCommand {
    /// Store the OpenRouter API key
    Set {
        /// OpenRouter API key
        key: String,
    },

    /// Show the stored key (masked)
    Show,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> Result<(), String> {
        // Can't specify both --days and --since/--until
        if self.days.is_some() && (self.since.is_some() || self.until.is_some()) {
            return Err(
                "Cannot specify both --days and --since/--until. Choose one.".to_string()
            );
        }

        if let (Some(since), Some(until)) = (self.since, self.until) {
            if until < since {
                return Err("End date cannot be earlier than start date".to_string());
            }
        }

        if self.days == Some(0) {
            return Err("--days must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Mask all but the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
