use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};
use tundra_account::AccountCache;
use tundra_core::{credit_outlasts_grace, AccountNumber, SubscriberId};
use tundra_jobs::JobTracker;

use crate::platform::{Clipboard, Navigator, Notifier, RootScreen};

/// Cadence of the background expiry refresh while the screen is visible.
pub const ACCOUNT_POLL_INTERVAL: Duration = Duration::from_secs(15);

pub const POLL_ACCOUNT_JOB: &str = "poll_account_data";
pub const UPDATE_ACCOUNT_JOB: &str = "update_account_number";
pub const ADVANCE_JOB: &str = "advance_to_connect";
pub const FETCH_PURCHASE_URL_JOB: &str = "fetch_purchase_url";
pub const OPEN_PURCHASE_PAGE_JOB: &str = "open_purchase_page";

/// What the account label should currently draw. `enabled` doubles as the
/// copy-gesture gate: an empty label is not interactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountLabel {
    pub text: String,
    pub enabled: bool,
}

#[derive(Default)]
struct ViewState {
    label: AccountLabel,
    raw_number: Option<AccountNumber>,
}

/// Welcome screen of the client: shows the account number while the account
/// has no usable credit, polls the daemon for expiry updates, and advances
/// to the connect screen once credit clears the grace rule.
///
/// The screen holds no framework lifecycle knowledge. The hosting shell
/// calls `on_activate` / `on_deactivate` exactly once per visibility
/// transition, never re-entrantly, and `on_deactivate` before the view goes
/// away. Between those calls every view mutation is marshalled through the
/// UI lane and guarded by the attach epoch, so a callback that fires late
/// lands as a no-op instead of touching a torn-down view.
pub struct WelcomeScreen {
    id: SubscriberId,
    cache: Arc<AccountCache>,
    jobs: JobTracker,
    navigator: Arc<dyn Navigator>,
    clipboard: Arc<dyn Clipboard>,
    notifier: Arc<dyn Notifier>,
    view: Arc<Mutex<ViewState>>,
    epoch: Arc<AtomicU64>,
}

impl WelcomeScreen {
    pub fn new(
        cache: Arc<AccountCache>,
        jobs: JobTracker,
        navigator: Arc<dyn Navigator>,
        clipboard: Arc<dyn Clipboard>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            id: SubscriberId::new(),
            cache,
            jobs,
            navigator,
            clipboard,
            notifier,
            view: Arc::new(Mutex::new(ViewState::default())),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attach: subscribe to both account feeds under this screen's identity
    /// and start the expiry poller. Safe to call again without an
    /// intervening deactivate; feed upsert and the tracker's replace policy
    /// keep subscriptions and pollers single.
    pub fn on_activate(&self) {
        let generation = self.epoch.load(Ordering::SeqCst);

        let jobs = self.jobs.clone();
        let view = self.view.clone();
        let epoch = self.epoch.clone();
        self.cache
            .on_account_number_change
            .subscribe(self.id, move |number| {
                let text = number
                    .as_ref()
                    .map(AccountNumber::formatted)
                    .unwrap_or_default();
                let view = view.clone();
                let epoch = epoch.clone();
                jobs.spawn_ui_job(UPDATE_ACCOUNT_JOB, move || {
                    if epoch.load(Ordering::SeqCst) != generation {
                        return;
                    }
                    let mut state = lock(&view);
                    state.label.enabled = !text.is_empty();
                    state.label.text = text;
                    state.raw_number = number;
                });
            });

        let jobs = self.jobs.clone();
        let navigator = self.navigator.clone();
        let epoch = self.epoch.clone();
        self.cache
            .on_account_expiry_change
            .subscribe(self.id, move |expiry| {
                let Some(expiry) = expiry else {
                    return;
                };
                if !credit_outlasts_grace(expiry, Utc::now()) {
                    return;
                }
                let navigator = navigator.clone();
                let epoch = epoch.clone();
                jobs.spawn_ui_job(ADVANCE_JOB, move || {
                    if epoch.load(Ordering::SeqCst) != generation {
                        return;
                    }
                    info!(event = "advance_to_connect");
                    if let Err(err) = navigator.replace_root(RootScreen::Connect) {
                        warn!(event = "screen_transition_failed", error = %err);
                    }
                });
            });

        let cache = self.cache.clone();
        self.jobs.spawn_background_job(POLL_ACCOUNT_JOB, async move {
            loop {
                cache.fetch_account_expiry();
                tokio::time::sleep(ACCOUNT_POLL_INTERVAL).await;
            }
        });
    }

    /// Detach: after this returns, no deferred work from the poller or
    /// either subscription mutates the view again. The epoch bump turns any
    /// still-queued UI closure from this activation into a no-op; cancelling
    /// the named jobs additionally drops them at the tracker level.
    pub fn on_deactivate(&self) {
        self.cache.on_account_number_change.unsubscribe(self.id);
        self.cache.on_account_expiry_change.unsubscribe(self.id);
        self.jobs.cancel_job(POLL_ACCOUNT_JOB);

        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.jobs.cancel_job(UPDATE_ACCOUNT_JOB);
        self.jobs.cancel_job(ADVANCE_JOB);
        self.jobs.cancel_job(FETCH_PURCHASE_URL_JOB);
        self.jobs.cancel_job(OPEN_PURCHASE_PAGE_JOB);
    }

    /// Snapshot for the host's renderer and for tests.
    pub fn account_label(&self) -> AccountLabel {
        lock(&self.view).label.clone()
    }

    /// Copy the raw account value (not the spaced display text) to the
    /// clipboard and confirm with a transient notice. Best effort: failures
    /// are logged, never surfaced as errors. No-op while the label is empty.
    pub fn copy_account_number(&self) {
        let Some(raw) = lock(&self.view).raw_number.clone() else {
            return;
        };
        match self.clipboard.set_text(raw.as_str()) {
            Ok(()) => {
                if let Err(err) = self.notifier.show_notice("Account number copied to clipboard") {
                    warn!(event = "copy_notice_failed", error = %err);
                }
            }
            Err(err) => {
                warn!(event = "clipboard_copy_failed", error = %err);
            }
        }
    }

    pub fn open_settings(&self) {
        if let Err(err) = self.navigator.open_settings() {
            warn!(event = "open_settings_failed", error = %err);
        }
    }

    pub fn redeem_voucher(&self) {
        if let Err(err) = self.navigator.open_redeem_voucher() {
            warn!(event = "open_voucher_dialog_failed", error = %err);
        }
    }

    /// Buy-credit gesture: fetch the pre-authenticated purchase URL off the
    /// UI context, then hand it to the navigator on the UI lane. Named jobs
    /// on both legs, so mashing the button replaces instead of stacking, and
    /// the epoch guard drops a result that arrives after detach.
    pub fn open_purchase_page(&self) {
        let generation = self.epoch.load(Ordering::SeqCst);
        let daemon = self.cache.daemon();
        let jobs = self.jobs.clone();
        let navigator = self.navigator.clone();
        let epoch = self.epoch.clone();
        self.jobs
            .spawn_background_job(FETCH_PURCHASE_URL_JOB, async move {
                let url = match daemon.fetch_purchase_url().await {
                    Ok(url) => url,
                    Err(err) => {
                        warn!(event = "purchase_url_fetch_failed", error = %err);
                        return;
                    }
                };
                jobs.spawn_ui_job(OPEN_PURCHASE_PAGE_JOB, move || {
                    if epoch.load(Ordering::SeqCst) != generation {
                        return;
                    }
                    if let Err(err) = navigator.open_url(&url) {
                        warn!(event = "open_purchase_page_failed", error = %err);
                    }
                });
            });
    }
}

fn lock(view: &Arc<Mutex<ViewState>>) -> MutexGuard<'_, ViewState> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}
