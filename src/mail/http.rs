//! Implements the `Mailer` trait against the transactional-mail HTTP API.

use crate::mail::{Mailer, Message};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use url::Url;

/// POSTs messages as JSON to the endpoint named in the config, bearer
/// authenticated with the key from the secrets directory.
#[derive(Debug)]
pub(crate) struct HttpMailer {
    endpoint: Url,
    key: String,
}

impl HttpMailer {
    /// Checks the mail settings and reads the mail key.
    pub(crate) async fn new(config: &Config) -> Result<Self> {
        let mail = config.mail();
        let fields = [
            ("mail.endpoint", &mail.endpoint),
            ("mail.from", &mail.from),
            ("mail.to", &mail.to),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                bail!(
                    "'{field}' is not set in '{}'",
                    config.config_path().display()
                );
            }
        }
        let endpoint = Url::parse(&mail.endpoint).with_context(|| {
            format!(
                "'mail.endpoint' in '{}' is not a valid URL",
                config.config_path().display()
            )
        })?;

        let key_path = config.mail_key_path();
        let key = utils::read(&key_path).await.with_context(|| {
            format!("Failed to read the mail key from '{}'", key_path.display())
        })?;
        let key = key.trim().to_string();
        if key.is_empty() {
            bail!("The mail key file '{}' is empty", key_path.display());
        }

        Ok(Self { endpoint, key })
    }
}

#[async_trait::async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        let client = reqwest::Client::new();
        let response = client
            .post(self.endpoint.clone())
            .bearer_auth(&self.key)
            .json(message)
            .send()
            .await
            .context("Failed to send the message to the mail endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("The mail endpoint returned status {status}: {body}");
        }

        Ok(())
    }
}
