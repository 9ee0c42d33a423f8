use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The smallest day-of-month a job can be scheduled for.
pub(crate) const MIN_JOB_DAY: u32 = 1;

/// The largest day-of-month a job can be scheduled for. Capped at 28 so a job fires every
/// month, including February.
pub(crate) const MAX_JOB_DAY: u32 = 28;

/// A recurring monthly job, run by `penny jobs run-due` under an external scheduler.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Job {
    /// The database rowid.
    pub(crate) job_id: i64,
    pub(crate) kind: JobKind,
    /// The day of the month on or after which the job should fire, between 1 and 28.
    pub(crate) day_of_month: u32,
    /// The date the job last fired, or `None` if it never has.
    pub(crate) last_run: Option<NaiveDate>,
    pub(crate) enabled: bool,
}

impl Job {
    /// Returns true if the job should fire today. A job is due when it is enabled, today is
    /// on or after its scheduled day, and it has not already fired this calendar month.
    pub(crate) fn is_due(&self, today: NaiveDate) -> bool {
        if !self.enabled || today.day() < self.day_of_month {
            return false;
        }
        match self.last_run {
            None => true,
            Some(last_run) => (last_run.year(), last_run.month()) < (today.year(), today.month()),
        }
    }
}

/// The work a scheduled job performs.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum JobKind {
    /// Email a summary report of the previous month.
    #[default]
    EmailSummary,
    /// Write a JSON backup of the whole book.
    Backup,
}

serde_plain::derive_display_from_serialize!(JobKind);
serde_plain::derive_fromstr_from_deserialize!(JobKind);
