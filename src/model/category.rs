use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// A spending or income category, e.g. `Groceries` in the `Living` group.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    /// The unique category name.
    pub(crate) name: String,
    /// The group the category belongs to, e.g. `Living` or `Discretionary`.
    pub(crate) category_group: String,
    /// Whether transactions in this category are income or expenses.
    pub(crate) kind: CategoryKind,
    /// Hidden categories are excluded from the dashboard and from reports.
    pub(crate) hidden: bool,
}

impl Category {
    /// Applies any `Some` fields from `updates`, leaving the rest unchanged.
    pub(crate) fn merge_updates(&mut self, updates: &CategoryUpdates) {
        if let Some(rename) = &updates.rename {
            self.name = rename.clone();
        }
        if let Some(group) = &updates.category_group {
            self.category_group = group.clone();
        }
        if let Some(kind) = updates.kind {
            self.kind = kind;
        }
        if let Some(hidden) = updates.hidden {
            self.hidden = hidden;
        }
    }
}

/// Whether a category represents money coming in or money going out.
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
pub enum CategoryKind {
    #[default]
    Expense,
    Income,
}

serde_plain::derive_display_from_serialize!(CategoryKind);
serde_plain::derive_fromstr_from_deserialize!(CategoryKind);

/// Optional field changes for `penny update category`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Parser)]
pub struct CategoryUpdates {
    /// Rename the category. Transactions, budgets and goals follow the new name.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,

    /// Move the category to a different group.
    #[arg(long = "group")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_group: Option<String>,

    /// Change whether the category counts as income or expense.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CategoryKind>,

    /// Hide or unhide the category, e.g. `--hidden true`.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl CategoryUpdates {
    /// Returns true if no field was given.
    pub(crate) fn is_empty(&self) -> bool {
        self.rename.is_none()
            && self.category_group.is_none()
            && self.kind.is_none()
            && self.hidden.is_none()
    }
}
