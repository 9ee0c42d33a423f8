//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::config::MailConfig;
use crate::model::{
    Amount, Budget, Category, CategoryKind, Goal, Trade, TradeSide, Transaction,
};
use crate::Config;
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;

/// Test environment that sets up a penny home directory with Config and database.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with working mail settings and a seeded mail key, so both
    /// delivery modes can be constructed.
    pub async fn new() -> Self {
        let mail = MailConfig {
            endpoint: "https://api.mailprovider.example/v1/send".to_string(),
            from: "penny@example.com".to_string(),
            to: "me@example.com".to_string(),
        };
        let env = Self::with_mail(mail).await;
        std::fs::write(env.config.mail_key_path(), "test-mail-key").unwrap();
        env
    }

    /// Creates a test environment with the given mail settings and no mail key.
    pub async fn with_mail(mail: MailConfig) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("pennybook");
        let config = Config::create(&root, mail).await.unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Inserts a transaction with the given ID: -25.00 at the Coffee Shop on 2025-01-15,
    /// categorized as Food. The Food category is created if it does not exist yet.
    pub async fn insert_test_transaction(&self, transaction_id: &str) {
        if self.config.db().get_category("Food").await.unwrap().is_none() {
            self.insert_test_category("Food").await;
        }

        let transaction = Transaction {
            transaction_id: transaction_id.to_string(),
            date: "2025-01-15".parse().unwrap(),
            description: "Coffee Shop".to_string(),
            amount: Amount::from_str("-25.00").unwrap(),
            account: "Checking".to_string(),
            category: Some("Food".to_string()),
            note: "morning coffee".to_string(),
            tags: String::new(),
            fingerprint: None,
            date_added: "2025-01-15".parse().unwrap(),
        };
        self.config
            .db()
            .insert_transactions(&[transaction])
            .await
            .unwrap();
    }

    /// Inserts an expense category with the given name.
    pub async fn insert_test_category(&self, name: &str) {
        let category = Category {
            name: name.to_string(),
            category_group: "Everyday".to_string(),
            kind: CategoryKind::Expense,
            hidden: false,
        };
        self.config.db().insert_category(&category).await.unwrap();
    }

    /// Inserts a budget row. The category must already exist.
    pub async fn insert_test_budget(&self, category: &str, month: &str, amount: Decimal) {
        let budget = Budget {
            category: category.to_string(),
            month: month.to_string(),
            amount: Amount::new(amount),
        };
        self.config.db().insert_budget(&budget).await.unwrap();
    }

    /// Inserts a 10,000.00 savings goal funded by the given category, which must already
    /// exist.
    pub async fn insert_test_goal(&self, name: &str, category: &str) {
        let goal = Goal {
            name: name.to_string(),
            target_amount: Amount::new(Decimal::new(1_000_000, 2)),
            target_date: Some("2026-12-31".parse().unwrap()),
            category: category.to_string(),
            created_date: "2025-01-01".parse().unwrap(),
        };
        self.config.db().insert_goal(&goal).await.unwrap();
    }

    /// Inserts a buy of 10 units of the given symbol at 100.00 with no fees.
    pub async fn insert_test_trade(&self, symbol: &str) {
        let trade = Trade {
            trade_id: format!("trd-test-{symbol}"),
            date: "2025-01-10".parse().unwrap(),
            symbol: symbol.to_string(),
            side: TradeSide::Buy,
            quantity: Decimal::from(10),
            price: Decimal::from(100),
            fees: Decimal::ZERO,
            note: String::new(),
        };
        self.config.db().insert_trade(&trade).await.unwrap();
    }
}
