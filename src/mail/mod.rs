//! Outgoing mail.
//!
//! The `Mailer` trait separates the command layer from delivery. In
//! `Mode::Http` messages POST to the transactional-mail endpoint named in
//! the config; in `Mode::Test` they are written to `$PENNY_HOME/outbox/`
//! so the whole app can run top-to-bottom without a mail provider.

mod http;
mod outbox;

pub(crate) use http::HttpMailer;
pub(crate) use outbox::OutboxMailer;

use crate::{Config, Result};
use serde::{Deserialize, Serialize};

/// The environment variable that switches mail delivery into test mode.
pub const PENNY_IN_TEST_MODE: &str = "PENNY_IN_TEST_MODE";

/// Whether to use the real mail endpoint or the local outbox.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// POST messages to the configured mail endpoint.
    #[default]
    Http,
    /// Write messages to the outbox directory instead of sending them.
    Test,
}

impl Mode {
    /// Returns `Mode::Test` when `PENNY_IN_TEST_MODE` is set and non-zero
    /// in length, otherwise `Mode::Http`.
    pub fn from_env() -> Mode {
        match std::env::var(PENNY_IN_TEST_MODE) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// A plain-text email message.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) subject: String,
    pub(crate) text: String,
}

/// Delivers messages.
#[async_trait::async_trait]
pub trait Mailer {
    async fn send(&self, message: &Message) -> Result<()>;
}

/// Creates the `Mailer` for `mode`.
pub(crate) async fn mailer(config: &Config, mode: Mode) -> Result<Box<dyn Mailer + Send>> {
    Ok(match mode {
        Mode::Http => Box::new(HttpMailer::new(config).await?),
        Mode::Test => Box::new(OutboxMailer::new(config.outbox())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_env() {
        // Sequential on purpose. Command tests pass Mode explicitly, so no
        // other test reads this variable.
        std::env::set_var(PENNY_IN_TEST_MODE, "1");
        assert_eq!(Mode::from_env(), Mode::Test);

        std::env::set_var(PENNY_IN_TEST_MODE, "");
        assert_eq!(Mode::from_env(), Mode::Http);

        std::env::remove_var(PENNY_IN_TEST_MODE);
        assert_eq!(Mode::from_env(), Mode::Http);
    }
}
