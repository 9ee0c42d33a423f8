//! The pennybook home directory and its `config.json`.
//!
//! A home directory holds the database, the rotating backups, the mail key and
//! the test-mode outbox. `config.json` at its root carries the user-editable
//! settings, including the outgoing mail account.

use crate::backup::Backup;
use crate::db::Db;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "pennybook";
const CONFIG_VERSION: u8 = 1;
const DEFAULT_BACKUP_COPIES: u32 = 5;
const SECRETS_DIR: &str = ".secrets";
const BACKUPS_DIR: &str = ".backups";
const OUTBOX_DIR: &str = "outbox";
const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "pennybook.sqlite";
const MAIL_KEY_FILE: &str = "mail_key";

/// A ready-to-use view of a pennybook home directory: the parsed `config.json`,
/// the open database, and the well-known paths inside the home. `create` lays a
/// new home out on disk and `load` opens an existing one.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    outbox: PathBuf,
    config_path: PathBuf,
    sqlite_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
}

impl Config {
    /// Lays out a new home directory under `dir`: the subdirectories, a
    /// `config.json` seeded with `mail` and the default settings, and an empty
    /// database.
    ///
    /// The `mail` fields may all be left empty; `penny email` refuses to run
    /// until they are filled in.
    ///
    /// # Errors
    /// Fails if the directory cannot be set up or if `dir` already holds a
    /// database.
    pub async fn create(dir: impl Into<PathBuf>, mail: MailConfig) -> Result<Self> {
        let requested = dir.into();
        utils::make_dir(&requested)
            .await
            .context("Unable to create the pennybook home directory")?;
        let root = utils::canonicalize(&requested).await?;

        for name in [BACKUPS_DIR, SECRETS_DIR, OUTBOX_DIR] {
            utils::make_dir(root.join(name)).await?;
        }

        let config_file = ConfigFile {
            mail,
            ..ConfigFile::default()
        };
        config_file.save(root.join(CONFIG_FILE)).await?;

        let db = Db::init(root.join(DB_FILE))
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self::assemble(root, config_file, db))
    }

    /// Opens an existing home directory: checks that the home and its config
    /// file are present, loads `config.json`, opens the database and verifies
    /// the expected subdirectories exist.
    pub async fn load(penny_home: impl Into<PathBuf>) -> Result<Self> {
        let requested = penny_home.into();
        let root = utils::canonicalize(&requested).await?;
        let _ = utils::read_dir(&root)
            .await
            .context("Penny Home is missing")?;

        let config_path = root.join(CONFIG_FILE);
        if !config_path.is_file() {
            bail!("No config file at '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let db = Db::load(root.join(DB_FILE))
            .await
            .context("Unable to load SQLite DB")?;

        let config = Self::assemble(root, config_file, db);
        for dir in [&config.backups, &config.secrets] {
            if !dir.is_dir() {
                bail!("The home is missing its '{}' directory", dir.display())
            }
        }
        Ok(config)
    }

    /// Joins the well-known paths under `root`. Shared by `create` and `load`.
    fn assemble(root: PathBuf, config_file: ConfigFile, db: Db) -> Self {
        Self {
            backups: root.join(BACKUPS_DIR),
            secrets: root.join(SECRETS_DIR),
            outbox: root.join(OUTBOX_DIR),
            config_path: root.join(CONFIG_FILE),
            sqlite_path: root.join(DB_FILE),
            root,
            config_file,
            db,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The directory where test-mode mail is written instead of being sent.
    pub fn outbox(&self) -> &Path {
        &self.outbox
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn mail(&self) -> &MailConfig {
        &self.config_file.mail
    }

    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Where the mail API key lives. A relative `mail_key_path` resolves
    /// against the home directory; leaving it unset means
    /// `$PENNY_HOME/.secrets/mail_key`.
    pub fn mail_key_path(&self) -> PathBuf {
        let key = self
            .config_file
            .mail_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS_DIR).join(MAIL_KEY_FILE));
        if key.is_absolute() {
            key
        } else {
            self.root.join(key)
        }
    }
}

/// The outgoing mail settings, stored under the `mail` key of `config.json`.
#[derive(Default, Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct MailConfig {
    /// The transactional-mail HTTP endpoint messages are POSTed to.
    pub endpoint: String,
    /// The sender address.
    pub from: String,
    /// The recipient address.
    pub to: String,
}

/// What `config.json` holds on disk. A complete file looks like:
///
/// ```json
/// {
///   "app_name": "pennybook",
///   "config_version": 1,
///   "backup_copies": 10,
///   "mail": {
///     "endpoint": "https://api.mailprovider.example/v1/send",
///     "from": "penny@example.com",
///     "to": "me@example.com"
///   },
///   "mail_key_path": ".secrets/mail_key"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Always "pennybook". Guards against pointing the CLI at some other
    /// app's data directory.
    app_name: String,

    /// Format version of this file.
    config_version: u8,

    /// How many rotating backups to keep per backup kind.
    backup_copies: u32,

    /// Outgoing mail settings.
    #[serde(default)]
    mail: MailConfig,

    /// Where the mail API key lives, absolute or relative to the home.
    /// Unset means `.secrets/mail_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    mail_key_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: DEFAULT_BACKUP_COPIES,
            mail: MailConfig::default(),
            mail_key_path: None,
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let file: ConfigFile = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
        if file.app_name != APP_NAME {
            bail!(
                "Unexpected app_name '{}' in {} (expected '{}')",
                file.app_name,
                path.display(),
                APP_NAME
            );
        }
        Ok(file)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, json)
            .await
            .context("Unable to write config file")
    }
}
