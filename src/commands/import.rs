use crate::args::ImportArgs;
use crate::backup::IMPORT_PRE;
use crate::commands::Out;
use crate::import::parse_statement;
use crate::model::Transaction;
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use serde::Serialize;
use std::fs::File;

/// What an import run did, or would have done under `--preview`.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub(crate) imported: usize,
    pub(crate) duplicates: usize,
    pub(crate) skipped: u32,
    pub(crate) preview: bool,
}

/// Imports a bank statement CSV file into the transactions table.
///
/// The statement is parsed with header-based column detection, each row is
/// fingerprinted, and rows whose fingerprint is already in the book are
/// skipped, so importing the same statement twice is a no-op. A JSON backup
/// of the whole book is written before anything is inserted. `--preview`
/// stops after the dedup and prints what would be imported.
pub async fn import(config: Config, args: ImportArgs) -> Result<Out<ImportSummary>> {
    if let Some(category) = &args.category {
        if config.db().get_category(category).await?.is_none() {
            bail!("No category named '{category}'");
        }
    }

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let statement = parse_statement(file, &args.account, &args.columns, args.flip_signs)?;

    let existing = config.db().existing_fingerprints().await?;
    let (rows, already_in_book): (Vec<_>, Vec<_>) = statement
        .rows
        .into_iter()
        .partition(|row| !existing.contains(&row.fingerprint));

    let imported = rows.len();
    let duplicates = already_in_book.len() + statement.in_file_duplicates as usize;
    let skipped = statement.skipped;
    let counts = format!(
        "{imported} transaction{} ({duplicates} duplicate{} skipped, {skipped} row{} unparseable)",
        s(imported),
        s(duplicates),
        s(skipped as usize)
    );

    if args.preview {
        let mut message = format!("Would import {counts}");
        if !rows.is_empty() {
            let table: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    vec![
                        r.date.to_string(),
                        r.description.clone(),
                        r.amount.to_string(),
                    ]
                })
                .collect();
            let table = utils::render_table(&["Date", "Description", "Amount"], &table)?;
            message = format!("{message}\n\n{table}");
        }
        let summary = ImportSummary {
            imported,
            duplicates,
            skipped,
            preview: true,
        };
        return Ok(Out::new(message, summary));
    }

    if !rows.is_empty() {
        let book = config.db().book().await?;
        config.backup().save_json(IMPORT_PRE, &book).await?;

        let date_added = utils::today();
        let transactions: Vec<Transaction> = rows
            .into_iter()
            .map(|row| row.into_transaction(&args.account, args.category.as_deref(), date_added))
            .collect();
        config.db().insert_transactions(&transactions).await?;
    }

    let stamp = format!("{} {}", utils::today(), args.file.display());
    config.db().set_property("last_import", &stamp).await?;

    let summary = ImportSummary {
        imported,
        duplicates,
        skipped,
        preview: false,
    };
    Ok(Out::new(format!("Imported {counts}"), summary))
}

fn s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
