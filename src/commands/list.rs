//! List command handlers.
//!
//! Each handler prints its rows as an aligned text table and returns the raw rows as the
//! structured output.

use crate::args::{ListBudgetsArgs, ListTradesArgs, ListTransactionsArgs};
use crate::commands::Out;
use crate::model::{Budget, Category, Goal, Trade, Transaction};
use crate::utils;
use crate::{Config, Result};

/// Lists transactions matching the given filters, newest first.
pub async fn list_transactions(
    config: Config,
    args: ListTransactionsArgs,
) -> Result<Out<Vec<Transaction>>> {
    let transactions = config.db().list_transactions(&args.filter.filter()).await?;
    if transactions.is_empty() {
        return Ok("No transactions found".into());
    }

    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|t| {
            vec![
                t.transaction_id.clone(),
                t.date.to_string(),
                t.description.clone(),
                t.amount.to_string(),
                t.account.clone(),
                t.category.clone().unwrap_or_default(),
                t.tags.clone(),
            ]
        })
        .collect();
    let table = utils::render_table(
        &[
            "ID",
            "Date",
            "Description",
            "Amount",
            "Account",
            "Category",
            "Tags",
        ],
        &rows,
    )?;

    let count = transactions.len();
    let message = format!(
        "{} transaction{}\n\n{}",
        count,
        if count == 1 { "" } else { "s" },
        table
    );
    Ok(Out::new(message, transactions))
}

/// Lists every category, grouped the way the database orders them.
pub async fn list_categories(config: Config) -> Result<Out<Vec<Category>>> {
    let categories = config.db().list_categories().await?;
    if categories.is_empty() {
        return Ok("No categories found".into());
    }

    let rows: Vec<Vec<String>> = categories
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.category_group.clone(),
                c.kind.to_string(),
                if c.hidden { "yes".to_string() } else { String::new() },
            ]
        })
        .collect();
    let table = utils::render_table(&["Name", "Group", "Kind", "Hidden"], &rows)?;

    let count = categories.len();
    let message = format!(
        "{} categor{}\n\n{}",
        count,
        if count == 1 { "y" } else { "ies" },
        table
    );
    Ok(Out::new(message, categories))
}

/// Lists budgets, optionally restricted to one month.
pub async fn list_budgets(config: Config, args: ListBudgetsArgs) -> Result<Out<Vec<Budget>>> {
    let budgets = config.db().list_budgets(args.month.as_deref()).await?;
    if budgets.is_empty() {
        return Ok("No budgets found".into());
    }

    let rows: Vec<Vec<String>> = budgets
        .iter()
        .map(|b| vec![b.category.clone(), b.month.clone(), b.amount.to_string()])
        .collect();
    let table = utils::render_table(&["Category", "Month", "Amount"], &rows)?;

    let count = budgets.len();
    let message = format!(
        "{} budget{}\n\n{}",
        count,
        if count == 1 { "" } else { "s" },
        table
    );
    Ok(Out::new(message, budgets))
}

/// Lists every savings goal.
pub async fn list_goals(config: Config) -> Result<Out<Vec<Goal>>> {
    let goals = config.db().list_goals().await?;
    if goals.is_empty() {
        return Ok("No goals found".into());
    }

    let rows: Vec<Vec<String>> = goals
        .iter()
        .map(|g| {
            vec![
                g.name.clone(),
                g.target_amount.to_string(),
                g.target_date.map(|d| d.to_string()).unwrap_or_default(),
                g.category.clone(),
                g.created_date.to_string(),
            ]
        })
        .collect();
    let table = utils::render_table(
        &["Name", "Target", "Target date", "Category", "Created"],
        &rows,
    )?;

    let count = goals.len();
    let message = format!(
        "{} goal{}\n\n{}",
        count,
        if count == 1 { "" } else { "s" },
        table
    );
    Ok(Out::new(message, goals))
}

/// Lists trades in replay order, optionally restricted to one symbol.
pub async fn list_trades(config: Config, args: ListTradesArgs) -> Result<Out<Vec<Trade>>> {
    let symbol = args.symbol.map(|s| s.trim().to_uppercase());
    let trades = config.db().list_trades(symbol.as_deref()).await?;
    if trades.is_empty() {
        return Ok("No trades found".into());
    }

    let rows: Vec<Vec<String>> = trades
        .iter()
        .map(|t| {
            vec![
                t.trade_id.clone(),
                t.date.to_string(),
                t.symbol.clone(),
                t.side.to_string(),
                t.quantity.to_string(),
                t.price.to_string(),
                t.fees.to_string(),
            ]
        })
        .collect();
    let table = utils::render_table(
        &["ID", "Date", "Symbol", "Side", "Quantity", "Price", "Fees"],
        &rows,
    )?;

    let count = trades.len();
    let message = format!(
        "{} trade{}\n\n{}",
        count,
        if count == 1 { "" } else { "s" },
        table
    );
    Ok(Out::new(message, trades))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::TransactionFilterArgs;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_list_transactions_renders_table() {
        let env = TestEnv::new().await;
        env.insert_test_transaction("txn-test-001").await;
        env.insert_test_transaction("txn-test-002").await;

        let args = ListTransactionsArgs {
            filter: TransactionFilterArgs::default(),
        };
        let out = list_transactions(env.config(), args).await.unwrap();

        assert!(out.message().contains("2 transactions"));
        assert!(out.message().contains("Description"));
        assert_eq!(out.structure().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_transactions_empty() {
        let env = TestEnv::new().await;

        let args = ListTransactionsArgs {
            filter: TransactionFilterArgs::default(),
        };
        let out = list_transactions(env.config(), args).await.unwrap();

        assert_eq!(out.message(), "No transactions found");
        assert!(out.structure().is_none());
    }

    #[tokio::test]
    async fn test_list_categories_renders_table() {
        let env = TestEnv::new().await;
        env.insert_test_category("Food").await;

        let out = list_categories(env.config()).await.unwrap();
        assert!(out.message().contains("1 category"));
        assert!(out.message().contains("Food"));
    }

    #[tokio::test]
    async fn test_list_budgets_filters_by_month() {
        let env = TestEnv::new().await;
        env.insert_test_category("Food").await;
        env.insert_test_budget("Food", "2025-06", Decimal::new(40000, 2))
            .await;
        env.insert_test_budget("Food", "2025-07", Decimal::new(42000, 2))
            .await;

        let args = ListBudgetsArgs {
            month: Some("2025-06".to_string()),
        };
        let out = list_budgets(env.config(), args).await.unwrap();

        assert!(out.message().contains("1 budget"));
        assert_eq!(out.structure().unwrap().len(), 1);
        assert_eq!(out.structure().unwrap()[0].month, "2025-06");
    }

    #[tokio::test]
    async fn test_list_trades_uppercases_symbol_filter() {
        let env = TestEnv::new().await;
        env.insert_test_trade("VTI").await;

        let args = ListTradesArgs {
            symbol: Some("vti".to_string()),
        };
        let out = list_trades(env.config(), args).await.unwrap();

        assert!(out.message().contains("1 trade"));
        assert_eq!(out.structure().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_goals_empty() {
        let env = TestEnv::new().await;

        let out = list_goals(env.config()).await.unwrap();
        assert_eq!(out.message(), "No goals found");
    }
}
