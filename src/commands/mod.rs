//! The `penny` subcommand handlers.
//!
//! Each handler takes the loaded `Config` plus its clap args struct and
//! returns an [`Out`].

mod backup;
mod dashboard;
mod delete;
mod email;
mod export;
mod import;
mod init;
mod insert;
mod jobs;
mod list;
mod portfolio;
mod property;
mod report;
mod update;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use backup::backup;
pub use dashboard::dashboard;
pub use delete::{delete_budget, delete_category, delete_goal, delete_trade, delete_transactions};
pub use email::email;
pub use export::export;
pub use import::import;
pub use init::init;
pub use insert::{insert_budget, insert_category, insert_goal, insert_trade, insert_transaction};
pub use jobs::{jobs_add, jobs_disable, jobs_enable, jobs_list, jobs_remove, jobs_run_due};
pub use list::{list_budgets, list_categories, list_goals, list_trades, list_transactions};
pub use portfolio::portfolio;
pub use property::{property_delete, property_get, property_list, property_set};
pub use report::report;
pub use update::{update_budget, update_category, update_goal, update_transactions};

/// What a command hands back: a one-line account of what happened and, when
/// the command produced data, the data itself.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A human-readable account of the outcome.
    message: String,

    /// The command's data, when it has any.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Bundles a message with structured data.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// A message with no structured data.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// The human-readable account of the outcome.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The structured data, when present.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Logs the message at info level and the data, pretty-printed, at
    /// debug level.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Lets a handler finish with `Ok("all done".into())`.
impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

/// Controls how `penny report` renders its results.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Default: a plain-text table for reading in the terminal.
    #[default]
    Table,
    /// Pretty-printed JSON for piping into other tools.
    Json,
    /// CSV with a header row.
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_from_str_is_message_only() {
        let out: Out<serde_json::Value> = "all done".into();
        assert_eq!(out.message(), "all done");
        assert!(out.structure().is_none());
    }

    #[test]
    fn test_output_format_round_trips_names() {
        for (format, name) in [
            (OutputFormat::Table, "table"),
            (OutputFormat::Json, "json"),
            (OutputFormat::Csv, "csv"),
        ] {
            assert_eq!(format.to_string(), name);
            assert_eq!(name.parse::<OutputFormat>().unwrap(), format);
        }
    }
}
