mod cli;
mod config;
mod error;
mod jira;
mod orchestrator;
mod report;
mod store;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use cli::{mask_secret, AccountCommand, ApiKeyCommand, Cli, Commands};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use jira::{format_time_spent, DateRange};
use orchestrator::Orchestrator;
use report::format::{render_html, render_text};
use report::ReportRequest;
use store::{Account, CredentialStore, SledCredentialStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle subcommands
    if let Some(command) = &cli.command {
        return handle_command(command, &cli);
    }

    let config = load_config(&cli)?;
    let store = open_store(&config)?;

    run_report(config, store, &cli).await
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("worklog_recap={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file and apply CLI overrides
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load_or_create_default()?
    };

    Ok(apply_cli_overrides(config, cli))
}

fn open_store(config: &Config) -> anyhow::Result<SledCredentialStore> {
    let store_dir = config.store_dir()?;
    SledCredentialStore::open(&store_dir)
        .with_context(|| format!("Could not open account store at {}", store_dir.display()))
}

async fn run_report(config: Config, store: SledCredentialStore, cli: &Cli) -> anyhow::Result<()> {
    println!("worklog-recap v{}", env!("CARGO_PKG_VERSION"));
    println!("AI-powered status reports from your Jira worklogs\n");

    let length = config.default_length;
    let style = config.default_style;
    let language = config.default_language;
    let days = config.default_timespan_days;

    let orchestrator = Orchestrator::new(config, store)?;

    let account = match orchestrator.resolve_account(cli.account.as_deref()) {
        Ok(account) => account,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_configuration() {
                eprintln!("\nAdd an account with:");
                eprintln!("  worklog-recap account add --name <NAME> --email <EMAIL> --token <TOKEN> --url <URL>");
                eprintln!("then select it with --account <ID|NAME>");
            }
            std::process::exit(1);
        }
    };

    let range = match resolve_range(cli, days, Utc::now().date_naive()) {
        Ok(range) => range,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", "=".repeat(60));
    println!("Account: {} ({})", account.name, account.jira_url);
    println!("Range: {} to {}", range.start(), range.end());
    println!("Report: {} / {} / {}", length, style, language);
    println!("{}\n", "=".repeat(60));

    let request = ReportRequest {
        range,
        account,
        length,
        style,
        language,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Fetching worklogs and generating report...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = match orchestrator.generate_report(&request).await {
        Ok(report) => report,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("❌ Error: {}", e);
            if e.is_network() {
                eprintln!("\nCheck the Jira URL, email and API token of this account.");
            }
            std::process::exit(1);
        }
    };

    spinner.finish_with_message(format!(
        "Found {} worklogs across {} issues ({})",
        report.entries.len(),
        report.issues.len(),
        format_time_spent(report.total_seconds())
    ));

    let degraded = report.degraded_issue_count();
    if degraded > 0 {
        eprintln!(
            "⚠ {} issue(s) could not be refreshed; their worklogs may include entries outside the range",
            degraded
        );
    }

    println!("\n{}\n", report.text);
    println!(
        "*Generated at: {}*",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if cli.raw {
        println!("{}\n", "-".repeat(60));
        if cli.html {
            println!("{}", render_html(&report.entries));
        } else {
            println!("{}", render_text(&report.entries));
        }
    }

    if let Some(output) = &cli.output {
        std::fs::write(output, &report.text)
            .with_context(|| format!("Could not write report to {}", output.display()))?;
        println!("✓ Report written to: {}", output.display());
    }

    Ok(())
}

/// Date range from --since/--until, or the last `days` days before `today`
fn resolve_range(cli: &Cli, default_days: u32, today: NaiveDate) -> error::Result<DateRange> {
    match (cli.since, cli.until) {
        (Some(since), Some(until)) => DateRange::new(since, until),
        (Some(since), None) => DateRange::new(since, today),
        (None, Some(until)) => DateRange::days_back(until, default_days),
        (None, None) => DateRange::days_back(today, cli.days.unwrap_or(default_days)),
    }
}

fn handle_command(command: &Commands, cli: &Cli) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => {
            let config_path = Config::default_config_path()?;

            if config_path.exists() && !force {
                eprintln!(
                    "Config file already exists at: {}",
                    config_path.display()
                );
                eprintln!("Use --force to overwrite");
                std::process::exit(1);
            }

            Config::create_default()?;
            println!("✓ Created config file at: {}", config_path.display());
            println!("\nNext steps:");
            println!("  1. worklog-recap account add --name Work --email you@example.com --token <JIRA_TOKEN> --url https://<site>.atlassian.net");
            println!("  2. worklog-recap api-key set <OPENROUTER_KEY>");
        }
        Commands::Config => {
            let config = load_config(cli)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("Current configuration:\n");
            println!("{}", toml_str);
        }
        Commands::Account(account_command) => {
            let config = load_config(cli)?;
            let store = open_store(&config)?;
            handle_account_command(account_command, &store)?;
        }
        Commands::ApiKey(api_key_command) => {
            let config = load_config(cli)?;
            let store = open_store(&config)?;
            match api_key_command {
                ApiKeyCommand::Set { key } => {
                    store.set_api_key(key)?;
                    println!("✓ API key saved successfully!");
                }
                ApiKeyCommand::Show => match masked_api_key(&store) {
                    Ok(masked) => println!("OpenRouter API key: {}", masked),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        eprintln!("Set one with: worklog-recap api-key set <KEY>");
                        std::process::exit(1);
                    }
                },
            }
        }
    }
    Ok(())
}

fn handle_account_command(command: &AccountCommand, store: &impl CredentialStore) -> anyhow::Result<()> {
    match command {
        AccountCommand::Add(args) => {
            let account = Account::new(
                args.name.clone(),
                args.email.clone(),
                args.token.clone(),
                args.url.clone(),
            );
            let id = account.id.clone();
            store.add_account(account)?;
            println!("✓ Account added successfully! (id: {})", id);
        }
        AccountCommand::List => {
            let accounts = store.list_accounts()?;
            if accounts.is_empty() {
                println!("No accounts added yet.");
                return Ok(());
            }

            let last_selected = store.get_last_selected_account_id()?;
            for account in accounts {
                let marker = if last_selected.as_deref() == Some(account.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}  {}", marker, account.id, account.name);
                println!("    Email: {}", account.email);
                println!("    Jira URL: {}", account.jira_url);
            }
        }
        AccountCommand::Delete { id } => {
            if store.find_account(id)?.is_none() {
                eprintln!("Account not found: {}", id);
                std::process::exit(1);
            }
            store.delete_account(id)?;
            println!("✓ Account deleted successfully!");
        }
    }
    Ok(())
}

/// Stored API key with all but the last four characters hidden
fn masked_api_key(store: &impl CredentialStore) -> error::Result<String> {
    store.get_api_key().map(|key| mask_secret(&key))
}

fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(length) = cli.length {
        config.default_length = length;
    }

    if let Some(style) = cli.style {
        config.default_style = style;
    }

    if let Some(language) = cli.language {
        config.default_language = language;
    }

    if let Some(days) = cli.days {
        config.default_timespan_days = days;
    }

    if let Some(ref store) = cli.store {
        config.store_path = Some(store.clone());
    }

    config
}
