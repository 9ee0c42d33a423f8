//! Rotating snapshots of the book.

use crate::model::Book;
use crate::{utils, Config, Result};
use anyhow::Context;
use std::path::PathBuf;

/// Filename prefix for `penny backup` JSON snapshots.
pub const BOOK: &str = "book";

/// Filename prefix for the automatic snapshot taken before an import.
pub const IMPORT_PRE: &str = "import-pre";

/// Filename prefix for copies of the database file.
pub const SQLITE: &str = "pennybook.sqlite";

/// Writes snapshot files into the backups directory and rotates old ones out.
///
/// Snapshots are named `{prefix}.{date}-{NNN}[.json]` where NNN is a per-day
/// sequence number, so lexicographic filename order is creation order. At most
/// `backup_copies` files are kept per prefix. Create an instance via
/// `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
    sqlite_path: PathBuf,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
            sqlite_path: config.sqlite_path().to_path_buf(),
        }
    }

    /// Saves the book as a pretty-printed JSON snapshot and returns its path.
    pub async fn save_json(&self, prefix: &str, book: &Book) -> Result<PathBuf> {
        let json =
            serde_json::to_string_pretty(book).context("Failed to serialize the book to JSON")?;
        let path = self.next_path(prefix, "json").await?;
        utils::write(&path, json).await?;
        self.rotate(prefix, "json").await?;
        Ok(path)
    }

    /// Copies the database file into the backups directory and returns the copy's path.
    pub async fn copy_sqlite(&self) -> Result<PathBuf> {
        let path = self.next_path(SQLITE, "").await?;
        utils::copy(&self.sqlite_path, &path).await?;
        self.rotate(SQLITE, "").await?;
        Ok(path)
    }

    /// Builds the path for a new snapshot: today's date with one past the highest
    /// sequence number already on disk for this prefix and date.
    async fn next_path(&self, prefix: &str, extension: &str) -> Result<PathBuf> {
        let date = utils::today().to_string();
        let next = self
            .snapshots(prefix, extension)
            .await?
            .iter()
            .filter_map(|name| sequence_number(name, prefix, &date, extension))
            .max()
            .unwrap_or(0)
            + 1;
        let dot = if extension.is_empty() { "" } else { "." };
        Ok(self
            .backups_dir
            .join(format!("{prefix}.{date}-{next:03}{dot}{extension}")))
    }

    /// Deletes the oldest snapshots with this prefix until `backup_copies` remain.
    async fn rotate(&self, prefix: &str, extension: &str) -> Result<()> {
        let mut names = self.snapshots(prefix, extension).await?;
        names.sort();
        let excess = names.len().saturating_sub(self.backup_copies as usize);
        for name in names.into_iter().take(excess) {
            utils::remove(&self.backups_dir.join(name)).await?;
        }
        Ok(())
    }

    /// Lists the filenames in the backups directory that belong to this prefix.
    async fn snapshots(&self, prefix: &str, extension: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if belongs(&name, prefix, extension) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

fn belongs(filename: &str, prefix: &str, extension: &str) -> bool {
    if !filename.starts_with(prefix) || filename.as_bytes().get(prefix.len()) != Some(&b'.') {
        return false;
    }
    if extension.is_empty() {
        // The extensionless sqlite copies must not pick up JSON snapshots.
        !filename.ends_with(".json")
    } else {
        filename.ends_with(&format!(".{extension}"))
    }
}

/// The NNN from `{prefix}.{date}-NNN[.extension]`, or None when the name is not ours.
fn sequence_number(filename: &str, prefix: &str, date: &str, extension: &str) -> Option<u32> {
    let rest = filename.strip_prefix(prefix)?.strip_prefix('.')?;
    let rest = rest.strip_prefix(date)?.strip_prefix('-')?;
    let digits = if extension.is_empty() {
        rest
    } else {
        rest.strip_suffix(extension)?.strip_suffix('.')?
    };
    digits.parse().ok()
}
