use crate::args::ExportArgs;
use crate::commands::Out;
use crate::{report, Config, Result};
use anyhow::Context;
use std::io::Write;
use std::path::Path;

const HEADERS: [&str; 8] = [
    "id",
    "date",
    "description",
    "amount",
    "account",
    "category",
    "note",
    "tags",
];

/// Writes the selected transactions to a CSV file.
///
/// The filters are the same ones `penny list transactions` takes. Amounts are
/// written as plain decimals so the file round-trips through other tools.
/// Passing `--out -` writes the CSV to stdout instead of a file.
pub async fn export(config: Config, args: ExportArgs) -> Result<Out<()>> {
    let transactions = config.db().list_transactions(&args.filter.filter()).await?;
    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|t| {
            vec![
                t.transaction_id.clone(),
                t.date.to_string(),
                t.description.clone(),
                t.amount.plain(),
                t.account.clone(),
                t.category.clone().unwrap_or_default(),
                t.note.clone(),
                t.tags.clone(),
            ]
        })
        .collect();
    let csv = report::csv_string(&HEADERS, &rows)?;

    let count = transactions.len();
    let plural = if count == 1 { "" } else { "s" };
    if args.out == Path::new("-") {
        std::io::stdout()
            .write_all(csv.as_bytes())
            .context("Failed to write the CSV to stdout")?;
        return Ok(format!("Exported {count} transaction{plural} to stdout").into());
    }

    std::fs::write(&args.out, csv)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    Ok(format!("Exported {count} transaction{plural} to {}", args.out.display()).into())
}
