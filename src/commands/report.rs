//! The `penny report` command.
//!
//! Each subcommand builds its report struct from freshly-fetched rows and renders it in the
//! format requested with `--format`.

use crate::args::{ReportArgs, ReportSubcommand};
use crate::commands::{Out, OutputFormat};
use crate::db::TransactionFilter;
use crate::report;
use crate::utils;
use crate::{Config, Result};
use anyhow::{bail, Context};
use serde::Serialize;

/// Runs the requested report.
///
/// The message holds the report rendered per `--format`; the structured output always holds
/// the raw report values.
pub async fn report(config: Config, args: ReportArgs) -> Result<Out<serde_json::Value>> {
    let format = args.format();
    match args.entity() {
        ReportSubcommand::Monthly(monthly) => {
            let transactions = config
                .db()
                .list_transactions(&TransactionFilter::default())
                .await?;
            let report = report::monthly(monthly.year, &transactions);
            rendered(format, report, |r| r.table(), |r| r.csv())
        }
        ReportSubcommand::Categories(range) => {
            if range.from > range.to {
                bail!(
                    "The --from date ({}) must not be after the --to date ({})",
                    range.from,
                    range.to
                );
            }
            let filter = TransactionFilter {
                from: Some(range.from),
                to: Some(range.to),
                ..Default::default()
            };
            let transactions = config.db().list_transactions(&filter).await?;
            let categories = config.db().list_categories().await?;
            let report =
                report::category_totals(range.from, range.to, &transactions, &categories);
            rendered(format, report, |r| r.table(), |r| r.csv())
        }
        ReportSubcommand::Budget(budget) => {
            let month = budget
                .month
                .clone()
                .unwrap_or_else(|| utils::month_key(utils::today()));
            let budgets = config.db().list_budgets(Some(&month)).await?;
            let filter = TransactionFilter {
                month: Some(month.clone()),
                ..Default::default()
            };
            let transactions = config.db().list_transactions(&filter).await?;
            let report = report::budget_status(&month, &budgets, &transactions);
            rendered(format, report, |r| r.table(), |r| r.csv())
        }
        ReportSubcommand::Goals => {
            let goals = config.db().list_goals().await?;
            let transactions = config
                .db()
                .list_transactions(&TransactionFilter::default())
                .await?;
            let report = report::goal_progress(utils::today(), &goals, &transactions);
            rendered(format, report, |r| r.table(), |r| r.csv())
        }
    }
}

/// Renders `report` in the requested format and pairs it with the raw values.
fn rendered<T: Serialize>(
    format: OutputFormat,
    report: T,
    table: impl FnOnce(&T) -> Result<String>,
    csv: impl FnOnce(&T) -> Result<String>,
) -> Result<Out<serde_json::Value>> {
    let message = match format {
        OutputFormat::Table => table(&report)?,
        OutputFormat::Json => serde_json::to_string_pretty(&report)
            .context("Failed to serialize the report as JSON")?,
        OutputFormat::Csv => csv(&report)?,
    };
    let structure =
        serde_json::to_value(&report).context("Failed to serialize the report values")?;
    Ok(Out::new(message, structure))
}
