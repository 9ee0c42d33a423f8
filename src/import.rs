//! Statement parsing for `penny import`.
//!
//! Banks disagree on CSV layout, so the importer guesses column roles from
//! the header row and lets explicit `--*-col` flags override the guess.
//! Each parsed row gets a content fingerprint so the same statement can be
//! imported twice without duplicating rows.

use crate::model::{Amount, Transaction};
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

const DATE_PATTERNS: &[&str] = &["date", "posted", "post date"];
const DESCRIPTION_PATTERNS: &[&str] = &[
    "description",
    "desc",
    "memo",
    "payee",
    "merchant",
    "details",
    "narration",
];
const AMOUNT_PATTERNS: &[&str] = &["amount", "amt", "total"];
const DEBIT_PATTERNS: &[&str] = &["debit", "withdrawal"];
const CREDIT_PATTERNS: &[&str] = &["credit", "deposit"];

/// Explicit column assignments that bypass header detection.
#[derive(Default, Debug, Clone, Parser)]
pub struct ColumnOverrides {
    /// Header of the date column, when detection guesses wrong.
    #[arg(long = "date-col")]
    pub date_col: Option<String>,

    /// Header of the description column.
    #[arg(long = "description-col")]
    pub description_col: Option<String>,

    /// Header of the single signed amount column.
    #[arg(long = "amount-col")]
    pub amount_col: Option<String>,

    /// Header of the debit column, for statements that split amounts.
    #[arg(long = "debit-col")]
    pub debit_col: Option<String>,

    /// Header of the credit column, for statements that split amounts.
    #[arg(long = "credit-col")]
    pub credit_col: Option<String>,
}

/// Resolved column roles for one statement file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    date: usize,
    description: Option<usize>,
    amount: AmountColumns,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AmountColumns {
    /// One signed amount column.
    Single(usize),
    /// Separate debit and credit columns. At least one is present.
    Split {
        debit: Option<usize>,
        credit: Option<usize>,
    },
}

/// One statement row that parsed cleanly.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedRow {
    pub(crate) date: NaiveDate,
    pub(crate) description: String,
    pub(crate) amount: Amount,
    pub(crate) fingerprint: String,
}

impl ParsedRow {
    /// Builds the ledger row for this statement line.
    pub(crate) fn into_transaction(
        self,
        account: &str,
        category: Option<&str>,
        date_added: NaiveDate,
    ) -> Transaction {
        Transaction {
            transaction_id: utils::new_transaction_id(),
            date: self.date,
            description: self.description,
            amount: self.amount,
            account: account.to_string(),
            category: category.map(str::to_string),
            note: String::new(),
            tags: String::new(),
            fingerprint: Some(self.fingerprint),
            date_added,
        }
    }
}

/// Everything `parse_statement` learned from one file.
#[derive(Default, Debug, Clone)]
pub struct Statement {
    pub(crate) rows: Vec<ParsedRow>,
    /// Rows whose date or amount failed to parse.
    pub(crate) skipped: u32,
    /// Rows the statement itself repeats.
    pub(crate) in_file_duplicates: u32,
}

/// Parses a statement file into fingerprinted rows.
///
/// Rows with an unparseable date or amount are counted in `skipped` rather
/// than failing the import. Rows that repeat an earlier fingerprint within
/// the same file are collapsed into `in_file_duplicates`.
pub(crate) fn parse_statement(
    reader: impl std::io::Read,
    account: &str,
    overrides: &ColumnOverrides,
    flip_signs: bool,
) -> Result<Statement> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader
        .headers()
        .context("Failed to read the CSV header row")?
        .clone();
    let map = map_columns(&headers, overrides)?;

    let mut statement = Statement::default();
    let mut seen: HashSet<String> = HashSet::new();
    for record in csv_reader.records() {
        let record = record.context("Failed to read a CSV record")?;
        let date = record.get(map.date).and_then(parse_statement_date);
        let value = read_amount(&record, &map.amount);
        let (Some(date), Some(value)) = (date, value) else {
            statement.skipped += 1;
            continue;
        };
        let value = if flip_signs { -value } else { value };
        let description = map
            .description
            .and_then(|ix| record.get(ix))
            .unwrap_or_default()
            .trim()
            .to_string();
        let fingerprint = fingerprint(account, date, value, &description);
        if !seen.insert(fingerprint.clone()) {
            statement.in_file_duplicates += 1;
            continue;
        }
        statement.rows.push(ParsedRow {
            date,
            description,
            amount: Amount::new(value),
            fingerprint,
        });
    }
    Ok(statement)
}

/// Resolves each column's role, from explicit overrides where given and
/// header-name heuristics otherwise.
pub(crate) fn map_columns(
    headers: &csv::StringRecord,
    overrides: &ColumnOverrides,
) -> Result<ColumnMap> {
    if overrides.amount_col.is_some()
        && (overrides.debit_col.is_some() || overrides.credit_col.is_some())
    {
        bail!("Give either --amount-col or --debit-col/--credit-col, not both");
    }

    let date = match &overrides.date_col {
        Some(name) => position_of(headers, name)?,
        None => detect(headers, DATE_PATTERNS, None).with_context(|| {
            format!(
                "No date column found. The header row has: {}",
                header_list(headers)
            )
        })?,
    };

    let description = match &overrides.description_col {
        Some(name) => Some(position_of(headers, name)?),
        None => detect(headers, DESCRIPTION_PATTERNS, Some(date)),
    };

    let amount = if let Some(name) = &overrides.amount_col {
        AmountColumns::Single(position_of(headers, name)?)
    } else if overrides.debit_col.is_some() || overrides.credit_col.is_some() {
        let debit = overrides
            .debit_col
            .as_deref()
            .map(|name| position_of(headers, name))
            .transpose()?;
        let credit = overrides
            .credit_col
            .as_deref()
            .map(|name| position_of(headers, name))
            .transpose()?;
        AmountColumns::Split { debit, credit }
    } else if let Some(ix) = detect(headers, AMOUNT_PATTERNS, Some(date)) {
        AmountColumns::Single(ix)
    } else {
        let debit = detect(headers, DEBIT_PATTERNS, Some(date));
        let credit = detect(headers, CREDIT_PATTERNS, Some(date));
        if debit.is_none() && credit.is_none() {
            bail!(
                "No amount, debit or credit column found. The header row has: {}",
                header_list(headers)
            );
        }
        AmountColumns::Split { debit, credit }
    };

    Ok(ColumnMap {
        date,
        description,
        amount,
    })
}

fn position_of(headers: &csv::StringRecord, wanted: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(wanted))
        .with_context(|| {
            format!(
                "No column named '{wanted}'. The header row has: {}",
                header_list(headers)
            )
        })
}

/// Returns the first column (other than `skip`) whose header contains one
/// of the patterns, case-insensitively.
fn detect(headers: &csv::StringRecord, patterns: &[&str], skip: Option<usize>) -> Option<usize> {
    headers.iter().enumerate().find_map(|(ix, header)| {
        if Some(ix) == skip {
            return None;
        }
        let lower = header.to_lowercase();
        patterns.iter().any(|p| lower.contains(p)).then_some(ix)
    })
}

fn header_list(headers: &csv::StringRecord) -> String {
    headers.iter().collect::<Vec<_>>().join(", ")
}

fn read_amount(record: &csv::StringRecord, columns: &AmountColumns) -> Option<Decimal> {
    match columns {
        AmountColumns::Single(ix) => record.get(*ix).and_then(parse_statement_amount),
        AmountColumns::Split { debit, credit } => {
            let debit = debit
                .and_then(|ix| record.get(ix))
                .and_then(parse_statement_amount);
            let credit = credit
                .and_then(|ix| record.get(ix))
                .and_then(parse_statement_amount);
            // A debit spends money and a credit receives it, regardless of
            // how the bank signs the cells. When a row fills both, the
            // larger magnitude wins.
            match (debit, credit) {
                (Some(d), None) => Some(-d.abs()),
                (None, Some(c)) => Some(c.abs()),
                (Some(d), Some(c)) => {
                    if d.abs() >= c.abs() {
                        Some(-d.abs())
                    } else {
                        Some(c.abs())
                    }
                }
                (None, None) => None,
            }
        }
    }
}

/// Tries the date formats banks actually ship.
fn parse_statement_date(s: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%Y/%m/%d"];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parses an amount cell, tolerating currency symbols, thousands
/// separators and `(123.45)` parentheses negatives.
fn parse_statement_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (negated, s) = match s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let value: Decimal = cleaned.parse().ok()?;
    if negated && value > Decimal::ZERO {
        Some(-value)
    } else {
        Some(value)
    }
}

/// Computes a row's dedup key: the first 8 bytes of the SHA-256 of
/// `account|date|amount|description`, hex encoded. The amount is fixed to
/// two decimal places and the description lowercased with whitespace runs
/// collapsed, so cosmetic differences between statement exports do not
/// defeat the dedup.
pub(crate) fn fingerprint(
    account: &str,
    date: NaiveDate,
    amount: Decimal,
    description: &str,
) -> String {
    let normalized = description
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let input = format!("{account}|{date}|{amount:.2}|{normalized}");
    let digest = Sha256::digest(input.as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn headers(line: &str) -> csv::StringRecord {
        csv::StringRecord::from(line.split(',').collect::<Vec<_>>())
    }

    fn parse(csv_text: &str, overrides: &ColumnOverrides, flip: bool) -> Statement {
        parse_statement(csv_text.as_bytes(), "Checking", overrides, flip).unwrap()
    }

    #[test]
    fn test_map_columns_detects_single_amount() {
        let map = map_columns(
            &headers("Date,Description,Amount"),
            &ColumnOverrides::default(),
        )
        .unwrap();
        assert_eq!(map.date, 0);
        assert_eq!(map.description, Some(1));
        assert_eq!(map.amount, AmountColumns::Single(2));
    }

    #[test]
    fn test_map_columns_detects_split_debit_credit() {
        let map = map_columns(
            &headers("Posted Date,Memo,Withdrawal,Deposit"),
            &ColumnOverrides::default(),
        )
        .unwrap();
        assert_eq!(map.date, 0);
        assert_eq!(map.description, Some(1));
        assert_eq!(
            map.amount,
            AmountColumns::Split {
                debit: Some(2),
                credit: Some(3),
            }
        );
    }

    #[test]
    fn test_map_columns_honors_overrides() {
        let overrides = ColumnOverrides {
            date_col: Some("When".to_string()),
            description_col: Some("What".to_string()),
            amount_col: Some("How Much".to_string()),
            ..ColumnOverrides::default()
        };
        let map = map_columns(&headers("When,What,How Much"), &overrides).unwrap();
        assert_eq!(map.date, 0);
        assert_eq!(map.description, Some(1));
        assert_eq!(map.amount, AmountColumns::Single(2));
    }

    #[test]
    fn test_map_columns_missing_override_names_headers() {
        let overrides = ColumnOverrides {
            date_col: Some("Nope".to_string()),
            ..ColumnOverrides::default()
        };
        let err = map_columns(&headers("Date,Amount"), &overrides).unwrap_err();
        assert!(err.to_string().contains("Nope"));
        assert!(err.to_string().contains("Date, Amount"));
    }

    #[test]
    fn test_map_columns_missing_amount_is_an_error() {
        let err = map_columns(&headers("Date,Description"), &ColumnOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("Date, Description"));
    }

    #[test]
    fn test_map_columns_rejects_mixed_overrides() {
        let overrides = ColumnOverrides {
            amount_col: Some("Amount".to_string()),
            debit_col: Some("Debit".to_string()),
            ..ColumnOverrides::default()
        };
        assert!(map_columns(&headers("Date,Amount,Debit"), &overrides).is_err());
    }

    #[test]
    fn test_parse_statement_date_formats() {
        for s in [
            "2025-03-14",
            "03/14/2025",
            "03-14-2025",
            "2025/03/14",
        ] {
            assert_eq!(
                parse_statement_date(s),
                NaiveDate::from_ymd_opt(2025, 3, 14),
                "failed for {s}"
            );
        }
        // Day-first only resolves when month-first cannot.
        assert_eq!(
            parse_statement_date("25/03/2025"),
            NaiveDate::from_ymd_opt(2025, 3, 25)
        );
        assert_eq!(parse_statement_date("not a date"), None);
    }

    #[test]
    fn test_parse_statement_amount_tolerates_formatting() {
        assert_eq!(
            parse_statement_amount("$1,234.56"),
            Some(Decimal::from_str("1234.56").unwrap())
        );
        assert_eq!(
            parse_statement_amount("(45.00)"),
            Some(Decimal::from_str("-45").unwrap())
        );
        assert_eq!(
            parse_statement_amount("-12.34"),
            Some(Decimal::from_str("-12.34").unwrap())
        );
        assert_eq!(parse_statement_amount(""), None);
        assert_eq!(parse_statement_amount("n/a"), None);
    }

    #[test]
    fn test_parse_statement_basic() {
        let text = "Date,Description,Amount\n\
                    2025-03-01,COFFEE SHOP,-4.50\n\
                    2025-03-02,PAYCHECK,2000.00\n";
        let statement = parse(text, &ColumnOverrides::default(), false);
        assert_eq!(statement.rows.len(), 2);
        assert_eq!(statement.skipped, 0);
        let first = &statement.rows[0];
        assert_eq!(first.description, "COFFEE SHOP");
        assert_eq!(first.amount.value(), Decimal::from_str("-4.50").unwrap());
        assert_eq!(first.fingerprint.len(), 16);
    }

    #[test]
    fn test_parse_statement_skips_bad_rows() {
        let text = "Date,Description,Amount\n\
                    garbage,COFFEE,-1\n\
                    2025-03-02,NO AMOUNT,\n\
                    2025-03-03,GOOD,-2\n";
        let statement = parse(text, &ColumnOverrides::default(), false);
        assert_eq!(statement.rows.len(), 1);
        assert_eq!(statement.skipped, 2);
    }

    #[test]
    fn test_parse_statement_debits_import_negative() {
        let text = "Date,Memo,Debit,Credit\n\
                    2025-03-01,GROCERY,45.00,\n\
                    2025-03-02,REFUND,,12.00\n";
        let statement = parse(text, &ColumnOverrides::default(), false);
        assert_eq!(
            statement.rows[0].amount.value(),
            Decimal::from_str("-45").unwrap()
        );
        assert_eq!(
            statement.rows[1].amount.value(),
            Decimal::from_str("12").unwrap()
        );
    }

    #[test]
    fn test_parse_statement_flip_signs() {
        let text = "Date,Description,Amount\n\
                    2025-03-01,CARD PURCHASE,4.50\n";
        let statement = parse(text, &ColumnOverrides::default(), true);
        assert_eq!(
            statement.rows[0].amount.value(),
            Decimal::from_str("-4.50").unwrap()
        );
    }

    #[test]
    fn test_parse_statement_collapses_in_file_duplicates() {
        let text = "Date,Description,Amount\n\
                    2025-03-01,COFFEE,-4.50\n\
                    2025-03-01,COFFEE,-4.50\n";
        let statement = parse(text, &ColumnOverrides::default(), false);
        assert_eq!(statement.rows.len(), 1);
        assert_eq!(statement.in_file_duplicates, 1);
    }

    #[test]
    fn test_fingerprint_normalizes_description_and_amount() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let a = fingerprint("Checking", date, Decimal::from_str("-4.5").unwrap(), "Coffee  Shop");
        let b = fingerprint(
            "Checking",
            date,
            Decimal::from_str("-4.50").unwrap(),
            "COFFEE SHOP",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_varies_by_account() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let amount = Decimal::from_str("-4.50").unwrap();
        let a = fingerprint("Checking", date, amount, "COFFEE");
        let b = fingerprint("Savings", date, amount, "COFFEE");
        assert_ne!(a, b);
    }

    #[test]
    fn test_into_transaction_carries_the_row() {
        let text = "Date,Description,Amount\n2025-03-01,COFFEE,-4.50\n";
        let statement = parse(text, &ColumnOverrides::default(), false);
        let row = statement.rows[0].clone();
        let fingerprint = row.fingerprint.clone();
        let added = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let txn = row.into_transaction("Checking", Some("Dining"), added);
        assert_eq!(txn.account, "Checking");
        assert_eq!(txn.category.as_deref(), Some("Dining"));
        assert_eq!(txn.fingerprint.as_deref(), Some(fingerprint.as_str()));
        assert_eq!(txn.date_added, added);
        assert!(txn.transaction_id.starts_with("txn-"));
    }
}
