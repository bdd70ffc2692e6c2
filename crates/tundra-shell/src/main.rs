use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tundra_account::{AccountCache, AccountDaemon, DaemonError};
use tundra_jobs::{ui_lane, JobTracker};
use tundra_shell::platform::{Clipboard, Navigator, Notifier, PlatformError, RootScreen};
use tundra_shell::welcome::WelcomeScreen;

/// Headless demo host: drives the welcome screen against a simulated daemon
/// that reports paid-up credit after a configurable number of expiry polls.
#[derive(Parser, Debug)]
#[command(name = "tundra-shell")]
struct Args {
    /// Account number shown on the welcome screen.
    #[arg(long, default_value = "1234567890123456")]
    account: String,
    /// Expiry polls the simulated daemon answers with near-expiry credit
    /// before reporting a paid-up account.
    #[arg(long, default_value_t = 1)]
    activates_after: usize,
}

struct SimulatedDaemon {
    activates_after: usize,
    fetches: AtomicUsize,
}

#[async_trait]
impl AccountDaemon for SimulatedDaemon {
    async fn fetch_account_expiry(&self) -> Result<DateTime<Utc>, DaemonError> {
        let fetch = self.fetches.fetch_add(1, Ordering::SeqCst);
        if fetch < self.activates_after {
            Ok(Utc::now() + Duration::hours(1))
        } else {
            Ok(Utc::now() + Duration::days(30))
        }
    }

    async fn fetch_purchase_url(&self) -> Result<String, DaemonError> {
        Ok("https://account.tundra.example/top-up".to_string())
    }
}

enum ShellEvent {
    ReplaceRoot(RootScreen),
}

struct ChannelNavigator {
    tx: mpsc::UnboundedSender<ShellEvent>,
}

impl Navigator for ChannelNavigator {
    fn replace_root(&self, screen: RootScreen) -> Result<(), PlatformError> {
        self.tx
            .send(ShellEvent::ReplaceRoot(screen))
            .map_err(|err| PlatformError::Navigation(err.to_string()))
    }

    fn open_settings(&self) -> Result<(), PlatformError> {
        info!(event = "settings_opened");
        Ok(())
    }

    fn open_redeem_voucher(&self) -> Result<(), PlatformError> {
        info!(event = "voucher_dialog_opened");
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), PlatformError> {
        info!(event = "url_opened", url = %url);
        Ok(())
    }
}

struct LogClipboard;

impl Clipboard for LogClipboard {
    fn set_text(&self, text: &str) -> Result<(), PlatformError> {
        info!(event = "clipboard_set", text = %text);
        Ok(())
    }
}

struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_notice(&self, message: &str) -> Result<(), PlatformError> {
        info!(event = "notice_shown", message = %message);
        Ok(())
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let (shell_tx, mut shell_rx) = mpsc::unbounded_channel();
    let daemon = Arc::new(SimulatedDaemon {
        activates_after: args.activates_after,
        fetches: AtomicUsize::new(0),
    });
    let cache = Arc::new(AccountCache::new(daemon));
    let (ui, mut runner) = ui_lane();
    let tracker = JobTracker::new(ui);

    let screen = WelcomeScreen::new(
        cache.clone(),
        tracker.clone(),
        Arc::new(ChannelNavigator { tx: shell_tx }),
        Arc::new(LogClipboard),
        Arc::new(LogNotifier),
    );

    cache.set_account_number(Some(args.account.as_str().into()));
    screen.on_activate();
    runner.run_pending();
    info!(event = "welcome_shown", account = %screen.account_label().text);
    screen.copy_account_number();

    loop {
        tokio::select! {
            alive = runner.run_next() => {
                if !alive {
                    break;
                }
            }
            Some(event) = shell_rx.recv() => {
                match event {
                    ShellEvent::ReplaceRoot(root) => {
                        info!(event = "root_replaced", screen = ?root);
                        break;
                    }
                }
            }
        }
    }

    screen.on_deactivate();
    tracker.cancel_all_jobs();
    info!(event = "shell_exit");
    Ok(())
}
