//! Aggregations over the book's rows: the dashboard snapshot and the
//! `report` subcommand tables.
//!
//! Everything here is a pure linear pass over rows the caller already
//! fetched. Nothing in this module touches the database.

use crate::model::{Amount, Budget, Category, CategoryKind, Goal, Transaction};
use crate::{utils, Result};
use anyhow::{anyhow, Context};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Line label for transactions that have no category.
pub(crate) const UNCATEGORIZED: &str = "(uncategorized)";

// ==================== dashboard ====================

/// One month of the book rolled up for the dashboard (and the summary email).
#[derive(Debug, Clone, Serialize)]
pub struct MonthSnapshot {
    pub(crate) month: String,
    /// Sum of amounts in income-kind categories. Signed.
    pub(crate) income: Decimal,
    /// Sum of amounts in expense-kind categories. Signed, so normally negative.
    pub(crate) expense: Decimal,
    /// Sum of amounts with no category.
    pub(crate) uncategorized: Decimal,
    pub(crate) net: Decimal,
    pub(crate) categories: Vec<CategoryTotal>,
    pub(crate) budgets: BudgetRollup,
}

/// A category's total and row count within some date window.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub(crate) category: String,
    /// `None` for the uncategorized line.
    pub(crate) kind: Option<CategoryKind>,
    pub(crate) total: Decimal,
    pub(crate) count: usize,
}

/// The month's budget totals, hidden categories excluded.
#[derive(Default, Debug, Clone, Serialize)]
pub struct BudgetRollup {
    pub(crate) budgeted: Decimal,
    pub(crate) spent: Decimal,
    pub(crate) remaining: Decimal,
}

/// Rolls one month of rows into a `MonthSnapshot`.
///
/// `transactions` and `budgets` must already be filtered to `month`. The
/// headline income/expense/net figures include hidden categories; the
/// per-category rows and the budget rollup exclude them.
pub fn month_snapshot(
    month: &str,
    transactions: &[Transaction],
    categories: &[Category],
    budgets: &[Budget],
) -> MonthSnapshot {
    let by_name: BTreeMap<&str, &Category> =
        categories.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut uncategorized = Decimal::ZERO;
    for txn in transactions {
        let value = txn.amount.value();
        let kind = txn
            .category
            .as_deref()
            .and_then(|name| by_name.get(name))
            .map(|c| c.kind);
        match (&txn.category, kind) {
            (None, _) => uncategorized += value,
            (Some(_), Some(CategoryKind::Income)) => income += value,
            (Some(_), _) => expense += value,
        }
    }

    let mut spent_by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    for txn in transactions {
        if let Some(name) = txn.category.as_deref() {
            *spent_by_category.entry(name).or_default() += txn.amount.value();
        }
    }
    let mut budget_rollup = BudgetRollup::default();
    for budget in budgets {
        if by_name
            .get(budget.category.as_str())
            .is_some_and(|c| c.hidden)
        {
            continue;
        }
        budget_rollup.budgeted += budget.amount.value();
        budget_rollup.spent -= spent_by_category
            .get(budget.category.as_str())
            .copied()
            .unwrap_or_default();
    }
    budget_rollup.remaining = budget_rollup.budgeted - budget_rollup.spent;

    MonthSnapshot {
        month: month.to_string(),
        income,
        expense,
        uncategorized,
        net: income + expense + uncategorized,
        categories: category_rows(transactions.iter(), &by_name),
        budgets: budget_rollup,
    }
}

impl MonthSnapshot {
    /// Renders the one-screen text summary. The summary email sends this
    /// same text as the message body.
    pub fn text(&self) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "Summary for {}", self.month)?;
        writeln!(out)?;
        writeln!(out, "Income:        {}", Amount::new(self.income))?;
        writeln!(out, "Expenses:      {}", Amount::new(self.expense))?;
        writeln!(out, "Uncategorized: {}", Amount::new(self.uncategorized))?;
        writeln!(out, "Net:           {}", Amount::new(self.net))?;
        writeln!(out)?;
        if self.categories.is_empty() {
            writeln!(out, "No transactions recorded for {}.", self.month)?;
        } else {
            let rows: Vec<Vec<String>> = self
                .categories
                .iter()
                .map(|c| {
                    vec![
                        c.category.clone(),
                        c.kind.map(|k| k.to_string()).unwrap_or_default(),
                        Amount::new(c.total).to_string(),
                        c.count.to_string(),
                    ]
                })
                .collect();
            out.push_str(&utils::render_table(
                &["Category", "Kind", "Total", "Count"],
                &rows,
            )?);
        }
        writeln!(out)?;
        writeln!(
            out,
            "Budgets: {} budgeted, {} spent, {} remaining",
            Amount::new(self.budgets.budgeted),
            Amount::new(self.budgets.spent),
            Amount::new(self.budgets.remaining)
        )?;
        Ok(out)
    }
}

/// Accumulates per-category totals, skipping hidden categories. Income
/// categories come first (largest total first), then expense categories
/// most spent first, then the uncategorized line.
fn category_rows<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
    by_name: &BTreeMap<&str, &Category>,
) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<String, CategoryTotal> = BTreeMap::new();
    for txn in transactions {
        let (label, kind, hidden) = match txn.category.as_deref() {
            None => (UNCATEGORIZED, None, false),
            Some(name) => match by_name.get(name) {
                Some(c) => (name, Some(c.kind), c.hidden),
                None => (name, None, false),
            },
        };
        if hidden {
            continue;
        }
        let entry = totals
            .entry(label.to_string())
            .or_insert_with(|| CategoryTotal {
                category: label.to_string(),
                kind,
                total: Decimal::ZERO,
                count: 0,
            });
        entry.total += txn.amount.value();
        entry.count += 1;
    }

    let rank = |t: &CategoryTotal| match t.kind {
        _ if t.category == UNCATEGORIZED => 2,
        Some(CategoryKind::Income) => 0,
        _ => 1,
    };
    let mut rows: Vec<CategoryTotal> = totals.into_values().collect();
    rows.sort_by(|a, b| {
        rank(a)
            .cmp(&rank(b))
            .then_with(|| match rank(a) {
                0 => b.total.cmp(&a.total),
                _ => a.total.cmp(&b.total),
            })
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

// ==================== report monthly ====================

/// Twelve months of income/expense/net plus a year total.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub(crate) year: i32,
    pub(crate) months: Vec<MonthRow>,
    pub(crate) total_income: Decimal,
    pub(crate) total_expense: Decimal,
    pub(crate) total_net: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthRow {
    pub(crate) month: String,
    pub(crate) income: Decimal,
    pub(crate) expense: Decimal,
    pub(crate) net: Decimal,
}

/// Builds the year report in one pass over the rows.
///
/// This report classifies by sign rather than by category kind, so inflows
/// land in the income column even when uncategorized.
pub fn monthly(year: i32, transactions: &[Transaction]) -> MonthlyReport {
    let mut months: Vec<MonthRow> = (1..=12)
        .map(|m| MonthRow {
            month: format!("{year}-{m:02}"),
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            net: Decimal::ZERO,
        })
        .collect();

    for txn in transactions {
        if txn.date.year() != year {
            continue;
        }
        let row = &mut months[txn.date.month0() as usize];
        let value = txn.amount.value();
        if value > Decimal::ZERO {
            row.income += value;
        } else {
            row.expense += value;
        }
        row.net += value;
    }

    let total_income = months.iter().map(|r| r.income).sum();
    let total_expense = months.iter().map(|r| r.expense).sum();
    let total_net = months.iter().map(|r| r.net).sum();
    MonthlyReport {
        year,
        months,
        total_income,
        total_expense,
        total_net,
    }
}

impl MonthlyReport {
    pub fn table(&self) -> Result<String> {
        let mut rows: Vec<Vec<String>> = self
            .months
            .iter()
            .map(|r| {
                vec![
                    r.month.clone(),
                    Amount::new(r.income).to_string(),
                    Amount::new(r.expense).to_string(),
                    Amount::new(r.net).to_string(),
                ]
            })
            .collect();
        rows.push(vec![
            "TOTAL".to_string(),
            Amount::new(self.total_income).to_string(),
            Amount::new(self.total_expense).to_string(),
            Amount::new(self.total_net).to_string(),
        ]);
        utils::render_table(&["Month", "Income", "Expense", "Net"], &rows)
    }

    pub fn csv(&self) -> Result<String> {
        let mut rows: Vec<Vec<String>> = self
            .months
            .iter()
            .map(|r| {
                vec![
                    r.month.clone(),
                    r.income.to_string(),
                    r.expense.to_string(),
                    r.net.to_string(),
                ]
            })
            .collect();
        rows.push(vec![
            "TOTAL".to_string(),
            self.total_income.to_string(),
            self.total_expense.to_string(),
            self.total_net.to_string(),
        ]);
        csv_string(&["month", "income", "expense", "net"], &rows)
    }
}

// ==================== report categories ====================

/// Per-category totals over an arbitrary date range.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub(crate) from: NaiveDate,
    pub(crate) to: NaiveDate,
    pub(crate) rows: Vec<CategoryTotal>,
}

/// Per-category totals and row counts over the inclusive range `from..=to`.
/// Hidden categories are excluded; uncategorized rows get their own line.
pub fn category_totals(
    from: NaiveDate,
    to: NaiveDate,
    transactions: &[Transaction],
    categories: &[Category],
) -> CategoryReport {
    let by_name: BTreeMap<&str, &Category> =
        categories.iter().map(|c| (c.name.as_str(), c)).collect();
    let in_range = transactions
        .iter()
        .filter(|txn| txn.date >= from && txn.date <= to);
    CategoryReport {
        from,
        to,
        rows: category_rows(in_range, &by_name),
    }
}

impl CategoryReport {
    pub fn table(&self) -> Result<String> {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|c| {
                vec![
                    c.category.clone(),
                    c.kind.map(|k| k.to_string()).unwrap_or_default(),
                    Amount::new(c.total).to_string(),
                    c.count.to_string(),
                ]
            })
            .collect();
        utils::render_table(&["Category", "Kind", "Total", "Count"], &rows)
    }

    pub fn csv(&self) -> Result<String> {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|c| {
                vec![
                    c.category.clone(),
                    c.kind.map(|k| k.to_string()).unwrap_or_default(),
                    c.total.to_string(),
                    c.count.to_string(),
                ]
            })
            .collect();
        csv_string(&["category", "kind", "total", "count"], &rows)
    }
}

// ==================== report budget ====================

/// Budget-versus-actual for one month.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetReport {
    pub(crate) month: String,
    pub(crate) rows: Vec<BudgetStatus>,
    pub(crate) total_budgeted: Decimal,
    pub(crate) total_spent: Decimal,
    pub(crate) total_remaining: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub(crate) category: String,
    pub(crate) budgeted: Decimal,
    /// Negated sum of the category's amounts, so spending reads positive.
    pub(crate) spent: Decimal,
    pub(crate) remaining: Decimal,
    /// `spent / budgeted`, zero when the budget is zero.
    pub(crate) utilization: Decimal,
}

/// Compares each of the month's budget rows against actual spending.
///
/// `budgets` and `transactions` must already be filtered to `month`. Unlike
/// the dashboard rollup, hidden categories keep their lines here.
pub fn budget_status(
    month: &str,
    budgets: &[Budget],
    transactions: &[Transaction],
) -> BudgetReport {
    let mut spent_by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    for txn in transactions {
        if let Some(name) = txn.category.as_deref() {
            *spent_by_category.entry(name).or_default() += txn.amount.value();
        }
    }

    let mut rows = Vec::new();
    let mut total_budgeted = Decimal::ZERO;
    let mut total_spent = Decimal::ZERO;
    for budget in budgets {
        let budgeted = budget.amount.value();
        let spent = -spent_by_category
            .get(budget.category.as_str())
            .copied()
            .unwrap_or_default();
        let utilization = if budgeted.is_zero() {
            Decimal::ZERO
        } else {
            spent / budgeted
        };
        total_budgeted += budgeted;
        total_spent += spent;
        rows.push(BudgetStatus {
            category: budget.category.clone(),
            budgeted,
            spent,
            remaining: budgeted - spent,
            utilization,
        });
    }

    BudgetReport {
        month: month.to_string(),
        rows,
        total_budgeted,
        total_spent,
        total_remaining: total_budgeted - total_spent,
    }
}

impl BudgetReport {
    pub fn table(&self) -> Result<String> {
        let mut rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.category.clone(),
                    Amount::new(r.budgeted).to_string(),
                    Amount::new(r.spent).to_string(),
                    Amount::new(r.remaining).to_string(),
                    percent(r.utilization),
                ]
            })
            .collect();
        rows.push(vec![
            "TOTAL".to_string(),
            Amount::new(self.total_budgeted).to_string(),
            Amount::new(self.total_spent).to_string(),
            Amount::new(self.total_remaining).to_string(),
            String::new(),
        ]);
        utils::render_table(
            &["Category", "Budgeted", "Spent", "Remaining", "Used"],
            &rows,
        )
    }

    pub fn csv(&self) -> Result<String> {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.category.clone(),
                    r.budgeted.to_string(),
                    r.spent.to_string(),
                    r.remaining.to_string(),
                    r.utilization.to_string(),
                ]
            })
            .collect();
        csv_string(
            &["category", "budgeted", "spent", "remaining", "utilization"],
            &rows,
        )
    }
}

// ==================== report goals ====================

#[derive(Debug, Clone, Serialize)]
pub struct GoalsReport {
    pub(crate) rows: Vec<GoalProgress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) target: Decimal,
    /// All-time sum of the funding category's transactions.
    pub(crate) saved: Decimal,
    pub(crate) remaining: Decimal,
    /// `saved / target`, unclamped. The table clamps to [0, 1] for display.
    pub(crate) progress: Decimal,
    pub(crate) target_date: Option<NaiveDate>,
    /// Days from today until the target date, zero once it has passed.
    pub(crate) days_left: Option<i64>,
}

/// Measures each goal against the all-time sum of its funding category.
pub fn goal_progress(
    today: NaiveDate,
    goals: &[Goal],
    transactions: &[Transaction],
) -> GoalsReport {
    let mut saved_by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    for txn in transactions {
        if let Some(name) = txn.category.as_deref() {
            *saved_by_category.entry(name).or_default() += txn.amount.value();
        }
    }

    let rows = goals
        .iter()
        .map(|goal| {
            let target = goal.target_amount.value();
            let saved = saved_by_category
                .get(goal.category.as_str())
                .copied()
                .unwrap_or_default();
            let progress = if target.is_zero() {
                Decimal::ZERO
            } else {
                saved / target
            };
            GoalProgress {
                name: goal.name.clone(),
                category: goal.category.clone(),
                target,
                saved,
                remaining: target - saved,
                progress,
                target_date: goal.target_date,
                days_left: goal.target_date.map(|d| (d - today).num_days().max(0)),
            }
        })
        .collect();
    GoalsReport { rows }
}

impl GoalsReport {
    pub fn table(&self) -> Result<String> {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                let clamped = r.progress.clamp(Decimal::ZERO, Decimal::ONE);
                vec![
                    r.name.clone(),
                    r.category.clone(),
                    Amount::new(r.target).to_string(),
                    Amount::new(r.saved).to_string(),
                    Amount::new(r.remaining).to_string(),
                    percent(clamped),
                    r.days_left.map(|d| d.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        utils::render_table(
            &[
                "Goal",
                "Category",
                "Target",
                "Saved",
                "Remaining",
                "Progress",
                "Days Left",
            ],
            &rows,
        )
    }

    pub fn csv(&self) -> Result<String> {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.category.clone(),
                    r.target.to_string(),
                    r.saved.to_string(),
                    r.remaining.to_string(),
                    r.progress.to_string(),
                    r.days_left.map(|d| d.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        csv_string(
            &[
                "goal",
                "category",
                "target",
                "saved",
                "remaining",
                "progress",
                "days_left",
            ],
            &rows,
        )
    }
}

// ==================== helpers ====================

fn percent(ratio: Decimal) -> String {
    format!("{}%", (ratio * Decimal::ONE_HUNDRED).round_dp(0))
}

/// Writes header and rows through the csv crate and returns the text.
pub(crate) fn csv_string(headers: &[&str], rows: &[Vec<String>]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(headers)
        .context("Failed to write the CSV header")?;
    for row in rows {
        wtr.write_record(row).context("Failed to write a CSV row")?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish the CSV output: {}", e.into_error()))?;
    String::from_utf8(bytes).context("The CSV output was not valid UTF-8")
}
