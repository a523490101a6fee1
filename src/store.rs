use crate::error::{RecapError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::Mutex;

pub const ACCOUNTS_KEY: &str = "jiraAccounts";
pub const API_KEY_KEY: &str = "openRouterApiKey";
pub const LAST_SELECTED_KEY: &str = "lastSelectedAccountId";

static LAST_ACCOUNT_ID: AtomicI64 = AtomicI64::new(0);

/// A configured connection to one Jira instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Creation timestamp in milliseconds, as a string
    pub id: String,
    /// Display name
    pub name: String,
    pub email: String,
    /// Jira API token
    pub token: String,
    /// Base URL of the Jira site
    #[serde(rename = "jiraUrl")]
    pub jira_url: String,
}

impl Account {
    /// Create an account whose id is its creation time
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
        jira_url: impl Into<String>,
    ) -> Self {
        Self {
            id: next_account_id().to_string(),
            name: name.into(),
            email: email.into(),
            token: token.into(),
            jira_url: jira_url.into(),
        }
    }
}

/// Millisecond timestamp, bumped past the last issued id when the clock has not advanced
fn next_account_id() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ACCOUNT_ID.load(Ordering::SeqCst);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ACCOUNT_ID.compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Persistent storage for accounts and settings.
///
/// Implementors provide raw key access; every operation reads through to
/// the backend so the latest write is always visible.
pub trait CredentialStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn write(&self, key: &str, value: &[u8]) -> Result<()>;

    fn list_accounts(&self) -> Result<Vec<Account>> {
        match self.read(ACCOUNTS_KEY)? {
            Some(data) => Ok(serde_json::from_slice(&data)?),
            None => Ok(Vec::new()),
        }
    }

    fn add_account(&self, account: Account) -> Result<()> {
        let mut accounts = self.list_accounts()?;
        accounts.push(account);
        self.write(ACCOUNTS_KEY, &serde_json::to_vec(&accounts)?)
    }

    fn delete_account(&self, id: &str) -> Result<()> {
        let accounts: Vec<Account> = self
            .list_accounts()?
            .into_iter()
            .filter(|account| account.id != id)
            .collect();
        self.write(ACCOUNTS_KEY, &serde_json::to_vec(&accounts)?)
    }

    fn find_account(&self, id: &str) -> Result<Option<Account>> {
        Ok(self
            .list_accounts()?
            .into_iter()
            .find(|account| account.id == id))
    }

    fn get_api_key(&self) -> Result<String> {
        let key = self
            .read(API_KEY_KEY)?
            .map(|data| String::from_utf8_lossy(&data).into_owned())
            .unwrap_or_default();

        if key.is_empty() {
            return Err(RecapError::NotConfigured("OpenRouter API key".to_string()));
        }
        Ok(key)
    }

    fn set_api_key(&self, key: &str) -> Result<()> {
        self.write(API_KEY_KEY, key.trim().as_bytes())
    }

    fn get_last_selected_account_id(&self) -> Result<Option<String>> {
        Ok(self
            .read(LAST_SELECTED_KEY)?
            .map(|data| String::from_utf8_lossy(&data).into_owned())
            .filter(|id| !id.is_empty()))
    }

    fn set_last_selected_account_id(&self, id: &str) -> Result<()> {
        self.write(LAST_SELECTED_KEY, id.as_bytes())
    }
}

/// Store backed by an on-disk sled database
pub struct SledCredentialStore {
    db: sled::Db,
}

impl SledCredentialStore {
    /// Create or open a store
    pub fn open(store_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(store_dir)?;
        let db = sled::open(store_dir.join("credentials.sled"))?;
        Ok(Self { db })
    }
}

impl CredentialStore for SledCredentialStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key, value)?;
        self.db.flush()?;
        Ok(())
    }
}

/// Process-local store for tests
#[cfg(test)]
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl CredentialStore for MemoryCredentialStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_account(name: &str) -> Account {
        Account::new(
            name,
            "dev@example.com",
            "jira-token",
            "https://acme.atlassian.net",
        )
    }

    #[test]
    fn test_account_ids_increase() {
        let first = sample_account("First");
        let second = sample_account("Second");
        let first_id: i64 = first.id.parse().unwrap();
        let second_id: i64 = second.id.parse().unwrap();
        assert!(second_id > first_id);
    }

    #[test]
    fn test_account_serialization_layout() {
        let account = Account {
            id: "1".to_string(),
            name: "Work".to_string(),
            email: "dev@example.com".to_string(),
            token: "t".to_string(),
            jira_url: "https://acme.atlassian.net".to_string(),
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("\"jiraUrl\":\"https://acme.atlassian.net\""));
    }

    #[test]
    fn test_memory_store_accounts() {
        let store = MemoryCredentialStore::new();
        assert!(store.list_accounts().unwrap().is_empty());

        let work = sample_account("Work");
        let side = sample_account("Side");
        store.add_account(work.clone()).unwrap();
        store.add_account(side.clone()).unwrap();
        assert_eq!(store.list_accounts().unwrap(), vec![work.clone(), side.clone()]);

        store.delete_account(&work.id).unwrap();
        assert_eq!(store.list_accounts().unwrap(), vec![side.clone()]);
        assert!(store.find_account(&work.id).unwrap().is_none());
        assert_eq!(store.find_account(&side.id).unwrap(), Some(side));

        // Unknown id is a no-op
        store.delete_account("missing").unwrap();
        assert_eq!(store.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn test_api_key_not_configured() {
        let store = MemoryCredentialStore::new();
        assert!(matches!(
            store.get_api_key(),
            Err(RecapError::NotConfigured(_))
        ));

        store.set_api_key("   ").unwrap();
        assert!(store.get_api_key().is_err());

        store.set_api_key("  sk-or-v1-abc \n").unwrap();
        assert_eq!(store.get_api_key().unwrap(), "sk-or-v1-abc");
    }

    #[test]
    fn test_last_selected_account() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get_last_selected_account_id().unwrap(), None);

        store.set_last_selected_account_id("42").unwrap();
        assert_eq!(
            store.get_last_selected_account_id().unwrap(),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_sled_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledCredentialStore::open(temp_dir.path()).unwrap();
        let account = sample_account("Work");

        store.add_account(account.clone()).unwrap();
        store.set_api_key("sk-or-v1-abc").unwrap();
        store.set_last_selected_account_id(&account.id).unwrap();

        assert_eq!(store.list_accounts().unwrap(), vec![account.clone()]);
        assert_eq!(store.get_api_key().unwrap(), "sk-or-v1-abc");
        assert_eq!(store.get_last_selected_account_id().unwrap(), Some(account.id.clone()));
        assert!(temp_dir.path().join("credentials.sled").exists());

        store.delete_account(&account.id).unwrap();
        assert!(store.list_accounts().unwrap().is_empty());
    }
}
