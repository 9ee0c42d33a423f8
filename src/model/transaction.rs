use crate::model::Amount;
use crate::{utils, Result};
use anyhow::bail;
use chrono::NaiveDate;
use clap::Parser;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// The largest number of installments a transaction can be split into.
pub(crate) const MAX_INSTALLMENTS: u32 = 120;

/// A single ledger entry. Expenses carry negative amounts, income positive.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    /// The unique, program-generated identifier, e.g. `txn-6ba7b810-...`.
    pub(crate) transaction_id: String,
    /// The date the transaction occurred.
    pub(crate) date: NaiveDate,
    pub(crate) description: String,
    pub(crate) amount: Amount,
    /// The account the transaction belongs to, e.g. `Chase Checking`.
    pub(crate) account: String,
    /// The category name, or `None` while uncategorized.
    pub(crate) category: Option<String>,
    pub(crate) note: String,
    /// Comma-separated free-form tags.
    pub(crate) tags: String,
    /// Statement-import dedup key. `None` for rows entered by hand.
    pub(crate) fingerprint: Option<String>,
    /// The date the row was added to the book.
    pub(crate) date_added: NaiveDate,
}

impl Transaction {
    /// Applies any `Some` fields from `updates`, leaving the rest unchanged. An empty
    /// string for `category` clears it.
    pub(crate) fn merge_updates(&mut self, updates: &TransactionUpdates) {
        if let Some(date) = updates.date {
            self.date = date;
        }
        if let Some(description) = &updates.description {
            self.description = description.clone();
        }
        if let Some(amount) = updates.amount {
            self.amount = amount;
        }
        if let Some(account) = &updates.account {
            self.account = account.clone();
        }
        if let Some(category) = &updates.category {
            if category.is_empty() {
                self.category = None;
            } else {
                self.category = Some(category.clone());
            }
        }
        if let Some(note) = &updates.note {
            self.note = note.clone();
        }
        if let Some(tags) = &updates.tags {
            self.tags = tags.clone();
        }
    }

    /// Splits this transaction into `count` monthly installments.
    ///
    /// Each installment carries `total / count` rounded toward zero to two decimal places,
    /// with the leftover cents folded into the first installment so the rows sum exactly to
    /// the original amount. Installment `i` is dated `i - 1` months after the original date
    /// (clamping the day when the target month is shorter), and its description gets an
    /// ` (i/count)` suffix. The first row keeps this transaction's id.
    pub(crate) fn split_installments(self, count: u32) -> Result<Vec<Transaction>> {
        if count == 0 || count > MAX_INSTALLMENTS {
            bail!("The installment count must be between 1 and {MAX_INSTALLMENTS}, got {count}");
        }
        if count == 1 {
            return Ok(vec![self]);
        }

        let total = self.amount.value();
        let per = (total / Decimal::from(count))
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let remainder = total - per * Decimal::from(count);

        let mut rows = Vec::with_capacity(count as usize);
        for ix in 0..count {
            let amount = if ix == 0 { per + remainder } else { per };
            let transaction_id = if ix == 0 {
                self.transaction_id.clone()
            } else {
                utils::new_transaction_id()
            };
            let description = if self.description.is_empty() {
                format!("({}/{count})", ix + 1)
            } else {
                format!("{} ({}/{count})", self.description, ix + 1)
            };
            rows.push(Transaction {
                transaction_id,
                date: utils::add_months(self.date, ix)?,
                description,
                amount: Amount::new(amount),
                account: self.account.clone(),
                category: self.category.clone(),
                note: self.note.clone(),
                tags: self.tags.clone(),
                fingerprint: None,
                date_added: self.date_added,
            });
        }
        Ok(rows)
    }
}

/// Optional field changes for `penny update transaction`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Parser)]
pub struct TransactionUpdates {
    /// New date, e.g. `2025-06-30`.
    #[arg(long, value_parser = utils::parse_date)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// New description.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// New amount, e.g. `-42.50` or `-$1,200.00`.
    #[arg(long, value_parser = utils::parse_amount, allow_hyphen_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,

    /// New account name.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// New category name. Pass an empty string to clear the category.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// New note.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// New comma-separated tags.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl TransactionUpdates {
    /// Returns true if no field was given.
    pub(crate) fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.description.is_none()
            && self.amount.is_none()
            && self.account.is_none()
            && self.category.is_none()
            && self.note.is_none()
            && self.tags.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn purchase(amount: &str) -> Transaction {
        Transaction {
            transaction_id: "txn-test".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            description: "New Couch".to_string(),
            amount: Amount::from_str(amount).unwrap(),
            account: "Visa".to_string(),
            category: Some("Furniture".to_string()),
            note: String::new(),
            tags: String::new(),
            fingerprint: None,
            date_added: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        }
    }

    #[test]
    fn test_split_sums_to_total() {
        let rows = purchase("-100.00").split_installments(3).unwrap();
        assert_eq!(rows.len(), 3);
        let total: Decimal = rows.iter().map(|t| t.amount.value()).sum();
        assert_eq!(total, Decimal::from_str("-100.00").unwrap());
        // -100 / 3 rounds toward zero to -33.33, leaving -0.01 on the first row.
        assert_eq!(rows[0].amount.value(), Decimal::from_str("-33.34").unwrap());
        assert_eq!(rows[1].amount.value(), Decimal::from_str("-33.33").unwrap());
        assert_eq!(rows[2].amount.value(), Decimal::from_str("-33.33").unwrap());
    }

    #[test]
    fn test_split_even_amount_has_no_remainder() {
        let rows = purchase("-90.00").split_installments(3).unwrap();
        for row in &rows {
            assert_eq!(row.amount.value(), Decimal::from_str("-30.00").unwrap());
        }
    }

    #[test]
    fn test_split_dates_advance_monthly_and_clamp() {
        let rows = purchase("-300.00").split_installments(3).unwrap();
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(rows[2].date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn test_split_descriptions_and_ids() {
        let rows = purchase("-300.00").split_installments(3).unwrap();
        assert_eq!(rows[0].description, "New Couch (1/3)");
        assert_eq!(rows[2].description, "New Couch (3/3)");
        assert_eq!(rows[0].transaction_id, "txn-test");
        assert_ne!(rows[1].transaction_id, rows[0].transaction_id);
        assert_ne!(rows[1].transaction_id, rows[2].transaction_id);
    }

    #[test]
    fn test_split_of_one_returns_row_unchanged() {
        let original = purchase("-300.00");
        let rows = original.clone().split_installments(1).unwrap();
        assert_eq!(rows, vec![original]);
    }

    #[test]
    fn test_split_count_out_of_range() {
        assert!(purchase("-300.00").split_installments(0).is_err());
        assert!(purchase("-300.00").split_installments(121).is_err());
    }

    #[test]
    fn test_merge_updates_clears_category_with_empty_string() {
        let mut transaction = purchase("-300.00");
        let updates = TransactionUpdates {
            category: Some(String::new()),
            note: Some("returned".to_string()),
            ..TransactionUpdates::default()
        };
        transaction.merge_updates(&updates);
        assert_eq!(transaction.category, None);
        assert_eq!(transaction.note, "returned");
        assert_eq!(transaction.description, "New Couch");
    }
}
