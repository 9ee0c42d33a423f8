//! Implements the `Mailer` trait by writing messages to the outbox directory.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the
//! whole app, top-to-bottom, without a mail provider.

use crate::mail::{Mailer, Message};
use crate::{utils, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;

/// Writes each message as a pretty-printed JSON file named
/// `mail.YYYY-MM-DD-NNN.json`.
pub(crate) struct OutboxMailer {
    outbox_dir: PathBuf,
}

impl OutboxMailer {
    pub(crate) fn new(outbox_dir: impl Into<PathBuf>) -> Self {
        Self {
            outbox_dir: outbox_dir.into(),
        }
    }

    /// Finds the first unused sequence number for today.
    fn next_path(&self) -> PathBuf {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let mut seq: u32 = 1;
        loop {
            let path = self.outbox_dir.join(format!("mail.{date}-{seq:03}.json"));
            if !path.exists() {
                return path;
            }
            seq += 1;
        }
    }
}

#[async_trait::async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        let path = self.next_path();
        let json = serde_json::to_string_pretty(message)
            .context("Failed to serialize the message to JSON")?;
        utils::write(&path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn message(subject: &str) -> Message {
        Message {
            from: "penny@example.com".to_string(),
            to: "me@example.com".to_string(),
            subject: subject.to_string(),
            text: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_writes_numbered_files() {
        let dir = TempDir::new().unwrap();
        let mailer = OutboxMailer::new(dir.path());
        mailer.send(&message("first")).await.unwrap();
        mailer.send(&message("second")).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("mail.") && names[0].ends_with("-001.json"));
        assert!(names[1].ends_with("-002.json"));
    }

    #[tokio::test]
    async fn test_sent_mail_round_trips() {
        let dir = TempDir::new().unwrap();
        let mailer = OutboxMailer::new(dir.path());
        let sent = message("pennybook summary for 2025-03");
        mailer.send(&sent).await.unwrap();

        let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        let json = std::fs::read_to_string(entry.path()).unwrap();
        let read: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(read, sent);
    }
}
