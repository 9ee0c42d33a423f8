use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// A planned spending (or income) amount for one category in one month.
///
/// Budget amounts are positive. For expense categories the budget is compared against the
/// absolute value of the month's spending.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Budget {
    /// The category the budget applies to.
    pub(crate) category: String,
    /// The month in `YYYY-MM` form.
    pub(crate) month: String,
    pub(crate) amount: Amount,
}
