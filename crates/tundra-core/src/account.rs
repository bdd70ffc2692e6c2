use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const DISPLAY_GROUP_LEN: usize = 4;

/// Opaque account identifier issued by the daemon. The raw value is what
/// goes on the wire and onto the clipboard; `formatted` is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display form: one space every four characters, left to right, the
    /// final group may be shorter. Empty input formats to empty output.
    pub fn formatted(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + self.0.len() / DISPLAY_GROUP_LEN);
        for (index, ch) in self.0.chars().enumerate() {
            if index > 0 && index % DISPLAY_GROUP_LEN == 0 {
                out.push(' ');
            }
            out.push(ch);
        }
        out
    }
}

impl From<String> for AccountNumber {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for AccountNumber {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the account has enough paid-up time left for the client to move
/// past the welcome screen. Expiry exactly at the boundary does not qualify.
pub fn credit_outlasts_grace(expiry: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expiry > now + Duration::days(1)
}
