use crate::config::Config;
use crate::error::{RecapError, Result};
use crate::jira::client::JiraClient;
use crate::jira::fetcher::WorklogFetcher;
use crate::jira::{DateRange, IssueWorklogs};
use crate::report::format::collect_entries;
use crate::report::openrouter::OpenRouterClient;
use crate::report::prompt::build_report_prompt;
use crate::report::{Report, ReportRequest};
use crate::store::{Account, CredentialStore};

/// Prefix of the report text when generation fails
pub const GENERATION_ERROR_PREFIX: &str = "Error generating resume";

/// Orchestrator for coordinating the report workflow
pub struct Orchestrator<S: CredentialStore> {
    config: Config,
    store: S,
    openrouter: OpenRouterClient,
}

impl<S: CredentialStore> Orchestrator<S> {
    /// Create a new orchestrator
    pub fn new(config: Config, store: S) -> Result<Self> {
        let openrouter = OpenRouterClient::new(config.request_timeout())?
            .with_model(config.model.clone())
            .with_api_url(config.openrouter_api_url.clone());

        Ok(Self {
            config,
            store,
            openrouter,
        })
    }

    /// Pick the account to report on.
    ///
    /// An explicit selector matches an account id or display name; without
    /// one the last selected account is used.
    pub fn resolve_account(&self, selector: Option<&str>) -> Result<Account> {
        let accounts = self.store.list_accounts()?;

        let wanted = match selector {
            Some(selector) => selector.to_string(),
            None => self
                .store
                .get_last_selected_account_id()?
                .ok_or(RecapError::NoAccountSelected)?,
        };

        accounts
            .iter()
            .find(|account| account.id == wanted)
            .or_else(|| accounts.iter().find(|account| account.name == wanted))
            .cloned()
            .ok_or(RecapError::AccountNotFound(wanted))
    }

    /// Fetch in-range worklogs for an account
    pub async fn fetch_worklogs(
        &self,
        account: &Account,
        range: &DateRange,
    ) -> Result<Vec<IssueWorklogs>> {
        let client = JiraClient::new(account, self.config.request_timeout())?;
        WorklogFetcher::new(client).fetch(range).await
    }

    /// Run one full report generation.
    ///
    /// Fetch failures abort; generation failures are reported inside the
    /// report text instead.
    pub async fn generate_report(&self, request: &ReportRequest) -> Result<Report> {
        self.store
            .set_last_selected_account_id(&request.account.id)?;

        let issues = match self.fetch_worklogs(&request.account, &request.range).await {
            Ok(issues) => issues,
            Err(e) => {
                tracing::error!(error = %e, account = %request.account.name, "worklog fetch failed");
                return Err(e);
            }
        };

        let text = match self.generate_text(&issues, request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "report generation failed");
                format!("{}: {}", GENERATION_ERROR_PREFIX, e)
            }
        };

        let entries = collect_entries(&issues, &request.range);
        Ok(Report::new(text, issues, entries))
    }

    /// Build the prompt and call the text-generation API
    async fn generate_text(&self, issues: &[IssueWorklogs], request: &ReportRequest) -> Result<String> {
        let api_key = self.store.get_api_key()?;
        let prompt = build_report_prompt(issues, request.length, request.style, request.language);
        self.openrouter.generate(&prompt, &api_key).await
    }

    /// Get a reference to the credential store
    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }
}
