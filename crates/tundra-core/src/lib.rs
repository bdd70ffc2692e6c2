pub mod account;
pub mod events;

pub use account::{credit_outlasts_grace, AccountNumber};
pub use events::{ChangeFeed, SubscriberId};
