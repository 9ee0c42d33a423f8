use crate::model::Amount;
use crate::utils;
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};

/// A savings goal funded by one category, e.g. `House Fund` fed by `Savings`.
///
/// Progress is the all-time sum of the category's transactions, so contributions should be
/// recorded as positive amounts in the goal's category.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Goal {
    /// The unique goal name.
    pub(crate) name: String,
    pub(crate) target_amount: Amount,
    /// The date the goal should be reached, if one was set.
    pub(crate) target_date: Option<NaiveDate>,
    /// The category whose transactions fund the goal.
    pub(crate) category: String,
    /// The date the goal was created.
    pub(crate) created_date: NaiveDate,
}

impl Goal {
    /// Applies any `Some` fields from `updates`, leaving the rest unchanged.
    pub(crate) fn merge_updates(&mut self, updates: &GoalUpdates) {
        if let Some(target_amount) = updates.target_amount {
            self.target_amount = target_amount;
        }
        if let Some(target_date) = updates.target_date {
            self.target_date = Some(target_date);
        }
        if let Some(category) = &updates.category {
            self.category = category.clone();
        }
    }
}

/// Optional field changes for `penny update goal`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Parser)]
pub struct GoalUpdates {
    /// New target amount, e.g. `20000`.
    #[arg(long, value_parser = utils::parse_amount)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<Amount>,

    /// New target date, e.g. `2027-01-01`.
    #[arg(long, value_parser = utils::parse_date)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,

    /// New funding category.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl GoalUpdates {
    /// Returns true if no field was given.
    pub(crate) fn is_empty(&self) -> bool {
        self.target_amount.is_none() && self.target_date.is_none() && self.category.is_none()
    }
}
