use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("notification failed: {0}")]
    Notification(String),
}

/// Root content the navigator can swap in. The welcome screen only ever
/// advances to `Connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootScreen {
    Welcome,
    Connect,
}

/// Navigation surface of the hosting shell. Screen transitions are terminal
/// for the component being left; the host guarantees `on_deactivate` fires
/// before the old view becomes unusable.
pub trait Navigator: Send + Sync {
    fn replace_root(&self, screen: RootScreen) -> Result<(), PlatformError>;

    fn open_settings(&self) -> Result<(), PlatformError>;

    /// Modal voucher dialog; the host returns to the previous screen when it
    /// is dismissed.
    fn open_redeem_voucher(&self) -> Result<(), PlatformError>;

    /// Open an external URL in the system browser.
    fn open_url(&self, url: &str) -> Result<(), PlatformError>;
}

pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), PlatformError>;
}

pub trait Notifier: Send + Sync {
    /// Transient, auto-dismissing confirmation message.
    fn show_notice(&self, message: &str) -> Result<(), PlatformError>;
}
