//! Types that represent the core data model, such as `Transaction` and `Category`.
mod amount;
mod budget;
mod category;
mod goal;
mod job;
mod trade;
mod transaction;

pub use amount::{Amount, AmountFormat};
pub use budget::Budget;
pub use category::{Category, CategoryKind, CategoryUpdates};
pub use goal::{Goal, GoalUpdates};
pub use job::{Job, JobKind};
use serde::{Deserialize, Serialize};
pub use trade::{Trade, TradeSide};
pub use transaction::{Transaction, TransactionUpdates};

pub(crate) use job::{MAX_JOB_DAY, MIN_JOB_DAY};

/// Every row set in the book. Used for JSON backups and whole-book exports.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Book {
    pub(crate) categories: Vec<Category>,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) budgets: Vec<Budget>,
    pub(crate) goals: Vec<Goal>,
    pub(crate) trades: Vec<Trade>,
}
