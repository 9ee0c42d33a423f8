use crate::commands::Out;
use crate::config::MailConfig;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - An initial `config.json` file with default settings
/// - The SQLite book with its schema applied
///
/// # Arguments
/// - `penny_home` - The directory that will be the root of the data directory, e.g.
///   `$HOME/pennybook`
/// - `mail` - Endpoint and addresses for the summary email. Any of these can be left blank and
///   filled in later by editing `config.json`.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(penny_home: &Path, mail: MailConfig) -> Result<Out<()>> {
    let _config = Config::create(penny_home, mail)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok("Successfully created the pennybook directory and config".into())
}
