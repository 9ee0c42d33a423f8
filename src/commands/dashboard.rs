//! The `penny dashboard` command.

use crate::args::DashboardArgs;
use crate::commands::Out;
use crate::db::TransactionFilter;
use crate::report::{self, MonthSnapshot};
use crate::utils;
use crate::{Config, Result};

/// Rolls one month of the book into the one-screen summary: income, expenses, net, category
/// totals and the budget rollup. Defaults to the current month.
pub async fn dashboard(config: Config, args: DashboardArgs) -> Result<Out<MonthSnapshot>> {
    let month = args
        .month
        .unwrap_or_else(|| utils::month_key(utils::today()));

    let filter = TransactionFilter {
        month: Some(month.clone()),
        ..Default::default()
    };
    let transactions = config.db().list_transactions(&filter).await?;
    let categories = config.db().list_categories().await?;
    let budgets = config.db().list_budgets(Some(&month)).await?;

    let snapshot = report::month_snapshot(&month, &transactions, &categories, &budgets);
    let message = snapshot.text()?;
    Ok(Out::new(message, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_dashboard_summarizes_requested_month() {
        let env = TestEnv::new().await;
        env.insert_test_transaction("txn-test-001").await; // 2025-01-15, -25.00, Food
        env.insert_test_budget("Food", "2025-01", Decimal::new(10000, 2))
            .await;

        let args = DashboardArgs {
            month: Some("2025-01".to_string()),
        };
        let out = dashboard(env.config(), args).await.unwrap();

        assert!(out.message().contains("Summary for 2025-01"));
        assert!(out.message().contains("Food"));
        let snapshot = out.structure().unwrap();
        assert_eq!(snapshot.expense, Decimal::new(-2500, 2));
        assert_eq!(snapshot.budgets.budgeted, Decimal::new(10000, 2));
    }

    #[tokio::test]
    async fn test_dashboard_empty_month() {
        let env = TestEnv::new().await;

        let args = DashboardArgs {
            month: Some("2030-01".to_string()),
        };
        let out = dashboard(env.config(), args).await.unwrap();

        assert!(out.message().contains("No transactions recorded for 2030-01"));
        let snapshot = out.structure().unwrap();
        assert_eq!(snapshot.net, Decimal::ZERO);
    }
}
