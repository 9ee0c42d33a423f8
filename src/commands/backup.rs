use crate::backup::BOOK;
use crate::commands::Out;
use crate::{Config, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Where a backup run put its two snapshot files.
#[derive(Debug, Clone, Serialize)]
pub struct BackupPaths {
    pub(crate) json: PathBuf,
    pub(crate) sqlite: PathBuf,
}

/// Snapshots the whole book into the backups directory.
///
/// Two files are written: a pretty-printed JSON dump of every row set and a
/// copy of the SQLite database file. Old snapshots rotate out once
/// `backup_copies` of either kind exist.
pub async fn backup(config: Config) -> Result<Out<BackupPaths>> {
    let book = config.db().book().await?;
    let backup = config.backup();
    let json = backup.save_json(BOOK, &book).await?;
    let sqlite = backup.copy_sqlite().await?;

    let message = format!(
        "Backed up the book to {} and {}",
        json.display(),
        sqlite.display()
    );
    Ok(Out::new(message, BackupPaths { json, sqlite }))
}
