pub mod platform;
pub mod welcome;

pub use platform::{Clipboard, Navigator, Notifier, PlatformError, RootScreen};
pub use welcome::{AccountLabel, WelcomeScreen, ACCOUNT_POLL_INTERVAL};
