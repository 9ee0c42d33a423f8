use crate::model::{Amount, MAX_JOB_DAY, MIN_JOB_DAY};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{Datelike, Local, Months, NaiveDate};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Copy a file.
pub(crate) async fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    tokio::fs::copy(from.as_ref(), to.as_ref())
        .await
        .map(|_| ())
        .with_context(|| {
            format!(
                "Unable to copy file from '{}' to '{}'",
                from.as_ref().to_string_lossy(),
                to.as_ref().to_string_lossy()
            )
        })
}

/// Delete a file.
pub(crate) async fn remove(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::remove_file(path)
        .await
        .with_context(|| format!("Unable to delete file at {}", path.display()))
}

/// Create a directory and any missing parents.
pub(crate) async fn make_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory at {}", path.display()))
}

/// Canonicalize a path, resolving symlinks and relative components.
pub(crate) async fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to canonicalize path {}", path.display()))
}

/// Open a directory for iteration.
pub(crate) async fn read_dir(path: impl AsRef<Path>) -> Result<tokio::fs::ReadDir> {
    let path = path.as_ref();
    tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("Unable to read directory at {}", path.display()))
}

/// Generates a unique transaction ID.
pub(crate) fn new_transaction_id() -> String {
    format!("txn-{}", Uuid::new_v4())
}

/// Generates a unique trade ID.
pub(crate) fn new_trade_id() -> String {
    format!("trd-{}", Uuid::new_v4())
}

/// Today's date in the local timezone.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Formats a date's month as a `YYYY-MM` key.
pub(crate) fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Adds `months` calendar months to `date`, clamping the day to the target month's length,
/// e.g. Jan 31 + 1 month = Feb 28.
pub(crate) fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .with_context(|| format!("Date {date} + {months} months is out of range"))
}

/// The first day of the month before the one containing `date`.
pub(crate) fn previous_month(date: NaiveDate) -> Result<NaiveDate> {
    let first = date
        .with_day(1)
        .with_context(|| format!("Unable to find the first day of the month for {date}"))?;
    first
        .checked_sub_months(Months::new(1))
        .with_context(|| format!("Date {date} - 1 month is out of range"))
}

/// Parses a `YYYY-MM-DD` date. Suitable as a clap `value_parser`.
pub(crate) fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("'{s}' is not a valid date, expected YYYY-MM-DD"))
}

/// Parses a `YYYY-MM` month string. Suitable as a clap `value_parser`.
pub(crate) fn parse_month(s: &str) -> std::result::Result<String, String> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map_err(|_| format!("'{s}' is not a valid month, expected YYYY-MM"))?;
    Ok(s.to_string())
}

/// Parses a dollar amount such as `-$1,200.00`. Suitable as a clap `value_parser`.
pub(crate) fn parse_amount(s: &str) -> std::result::Result<Amount, String> {
    Amount::from_str(s).map_err(|e| format!("'{s}' is not a valid amount: {e}"))
}

/// Parses a plain decimal such as a share quantity. Suitable as a clap `value_parser`.
pub(crate) fn parse_decimal(s: &str) -> std::result::Result<Decimal, String> {
    Decimal::from_str(s).map_err(|e| format!("'{s}' is not a valid number: {e}"))
}

/// Parses a job's day of month. Suitable as a clap `value_parser`.
pub(crate) fn parse_job_day(s: &str) -> std::result::Result<u32, String> {
    let day: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid day of the month"))?;
    if !(MIN_JOB_DAY..=MAX_JOB_DAY).contains(&day) {
        return Err(format!(
            "The day must be between {MIN_JOB_DAY} and {MAX_JOB_DAY}, got {day}"
        ));
    }
    Ok(day)
}

/// Renders rows as an aligned text table with a dashed rule under the header.
///
/// Every row must have the same number of cells as `headers`.
pub(crate) fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Result<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        if row.len() != headers.len() {
            bail!(
                "Table row has {} cells but there are {} headers",
                row.len(),
                headers.len()
            );
        }
        for (ix, cell) in row.iter().enumerate() {
            widths[ix] = widths[ix].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    render_row(&mut out, headers.iter().map(|h| h.to_string()), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    render_row(&mut out, rule.into_iter(), &widths);
    for row in rows {
        render_row(&mut out, row.iter().cloned(), &widths);
    }
    Ok(out)
}

fn render_row(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let cells: Vec<String> = cells.collect();
    let last = cells.len().saturating_sub(1);
    for (ix, cell) in cells.iter().enumerate() {
        let pad = widths[ix].saturating_sub(cell.chars().count());
        out.push_str(cell);
        // No trailing spaces after the final column.
        if ix != last {
            for _ in 0..pad {
                out.push(' ');
            }
            out.push_str("  ");
        }
    }
    out.push('\n');
}
