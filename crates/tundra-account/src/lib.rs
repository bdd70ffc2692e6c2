use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;
use tundra_core::{AccountNumber, ChangeFeed};

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("daemon unreachable: {0}")]
    Unreachable(String),
    #[error("no account is set")]
    NoAccount,
}

/// Transport seam towards the VPN daemon. The cache only ever calls this
/// from its own spawned tasks; implementations decide what "fetch" means
/// (RPC in the real client, scripted values in tests and the demo shell).
#[async_trait]
pub trait AccountDaemon: Send + Sync {
    async fn fetch_account_expiry(&self) -> Result<DateTime<Utc>, DaemonError>;

    /// URL of the account top-up page, pre-authenticated for this account.
    async fn fetch_purchase_url(&self) -> Result<String, DaemonError>;
}

#[derive(Default)]
struct AccountFields {
    number: Option<AccountNumber>,
    expiry: Option<DateTime<Utc>>,
}

/// Process-scoped cache of the signed-in account. Screens subscribe to the
/// two change feeds for as long as they are visible; the cache outlives any
/// of them. Both feeds replay the current value on subscribe, so a freshly
/// attached screen paints without waiting for the next change.
pub struct AccountCache {
    daemon: Arc<dyn AccountDaemon>,
    fields: Mutex<AccountFields>,
    pub on_account_number_change: ChangeFeed<Option<AccountNumber>>,
    pub on_account_expiry_change: ChangeFeed<Option<DateTime<Utc>>>,
}

impl AccountCache {
    pub fn new(daemon: Arc<dyn AccountDaemon>) -> Self {
        Self {
            daemon,
            fields: Mutex::new(AccountFields::default()),
            on_account_number_change: ChangeFeed::new(None),
            on_account_expiry_change: ChangeFeed::new(None),
        }
    }

    pub fn daemon(&self) -> Arc<dyn AccountDaemon> {
        self.daemon.clone()
    }

    pub fn account_number(&self) -> Option<AccountNumber> {
        self.fields().number.clone()
    }

    pub fn account_expiry(&self) -> Option<DateTime<Utc>> {
        self.fields().expiry
    }

    /// Publishes only on actual change; re-setting the same number is
    /// silent.
    pub fn set_account_number(&self, number: Option<AccountNumber>) {
        {
            let mut fields = self.fields();
            if fields.number == number {
                return;
            }
            fields.number = number.clone();
        }
        self.on_account_number_change.publish(number);
    }

    pub fn set_account_expiry(&self, expiry: Option<DateTime<Utc>>) {
        {
            let mut fields = self.fields();
            if fields.expiry == expiry {
                return;
            }
            fields.expiry = expiry;
        }
        self.on_account_expiry_change.publish(expiry);
    }

    /// Fire-and-forget refresh: ask the daemon for the current expiry and
    /// route the answer through the expiry feed. No direct return value; a
    /// failed fetch leaves the cached value untouched and the screen keeps
    /// showing whatever it had.
    pub fn fetch_account_expiry(self: &Arc<Self>) {
        let cache = self.clone();
        tokio::spawn(async move {
            match cache.daemon.fetch_account_expiry().await {
                Ok(expiry) => cache.set_account_expiry(Some(expiry)),
                Err(err) => {
                    debug!(event = "account_expiry_fetch_failed", error = %err);
                }
            }
        });
    }

    fn fields(&self) -> MutexGuard<'_, AccountFields> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
