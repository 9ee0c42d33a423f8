//! Delete command handlers.

use crate::args::{
    DeleteBudgetArgs, DeleteCategoryArgs, DeleteGoalArgs, DeleteTradeArgs, DeleteTransactionArgs,
};
use crate::commands::Out;
use crate::{Config, Result};

/// Deletes one or more transactions by ID atomically.
///
/// This operation is all-or-nothing: either all specified transactions are deleted, or none are.
/// If any transaction ID is not found, the entire operation is rolled back.
pub async fn delete_transactions(
    config: Config,
    args: DeleteTransactionArgs,
) -> Result<Out<Vec<String>>> {
    config.db().delete_transactions(&args.ids).await?;

    let count = args.ids.len();
    let message = format!(
        "Deleted {} transaction{}",
        count,
        if count == 1 { "" } else { "s" }
    );
    Ok(Out::new(message, args.ids))
}

/// Deletes a category by name.
///
/// Transactions in the category survive and become uncategorized, and the category's budgets
/// are removed with it. A category funding a goal cannot be deleted (`ON DELETE RESTRICT`);
/// the goal must be deleted or moved to another category first.
pub async fn delete_category(config: Config, args: DeleteCategoryArgs) -> Result<Out<String>> {
    config.db().delete_category(&args.name).await.map_err(|e| {
        let err_str = e.to_string();
        if err_str.contains("FOREIGN KEY constraint failed") {
            anyhow::anyhow!(
                "Cannot delete category '{}': one or more goals still reference it. \
                 Delete those goals or move them to another category first.",
                args.name
            )
        } else {
            e
        }
    })?;

    let message = format!("Deleted category: {}", args.name);
    Ok(Out::new(message, args.name))
}

/// Deletes the budget for one category and month.
pub async fn delete_budget(config: Config, args: DeleteBudgetArgs) -> Result<Out<()>> {
    config.db().delete_budget(&args.category, &args.month).await?;
    Ok(format!("Deleted the budget for '{}' in {}", args.category, args.month).into())
}

/// Deletes a goal by name.
pub async fn delete_goal(config: Config, args: DeleteGoalArgs) -> Result<Out<()>> {
    config.db().delete_goal(&args.name).await?;
    Ok(format!("Deleted goal: {}", args.name).into())
}

/// Deletes a trade by ID.
pub async fn delete_trade(config: Config, args: DeleteTradeArgs) -> Result<Out<()>> {
    config.db().delete_trade(&args.id).await?;
    Ok(format!("Deleted trade with ID: {}", args.id).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_delete_transactions_success() {
        let env = TestEnv::new().await;
        let txn_id = "txn-test-001";
        env.insert_test_transaction(txn_id).await;

        let args = DeleteTransactionArgs {
            ids: vec![txn_id.to_string()],
        };
        let result = delete_transactions(env.config(), args).await;

        assert!(result.is_ok());
        let out = result.unwrap();
        assert!(out.message().contains("Deleted 1 transaction"));
        assert_eq!(out.structure().unwrap(), &vec![txn_id.to_string()]);

        // Verify transaction no longer exists
        let deleted = env.config().db().get_transaction(txn_id).await.unwrap();
        assert!(deleted.is_none());
    }

    #[tokio::test]
    async fn test_delete_transactions_atomic_rollback() {
        let env = TestEnv::new().await;
        env.insert_test_transaction("txn-test-002").await;

        // One existing and one non-existing ID. Nothing may be deleted.
        let args = DeleteTransactionArgs {
            ids: vec!["txn-test-002".to_string(), "nonexistent".to_string()],
        };
        let result = delete_transactions(env.config(), args).await;
        assert!(result.is_err());

        let still_exists = env
            .config()
            .db()
            .get_transaction("txn-test-002")
            .await
            .unwrap();
        assert!(
            still_exists.is_some(),
            "Transaction should still exist after atomic rollback"
        );
    }

    #[tokio::test]
    async fn test_delete_category_uncategorizes_transactions() {
        let env = TestEnv::new().await;
        let txn_id = "txn-test-003";
        env.insert_test_transaction(txn_id).await;
        env.insert_test_budget("Food", "2025-06", Decimal::new(40000, 2))
            .await;

        let args = DeleteCategoryArgs {
            name: "Food".to_string(),
        };
        let out = delete_category(env.config(), args).await.unwrap();
        assert!(out.message().contains("Deleted category: Food"));

        // The transaction survives without a category
        let txn = env
            .config()
            .db()
            .get_transaction(txn_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(txn.category, None);

        // The category's budgets went with it
        let budgets = env.config().db().list_budgets(None).await.unwrap();
        assert!(budgets.is_empty());
    }

    #[tokio::test]
    async fn test_delete_category_blocked_by_goal() {
        let env = TestEnv::new().await;
        env.insert_test_category("Savings").await;
        env.insert_test_goal("Emergency Fund", "Savings").await;

        let args = DeleteCategoryArgs {
            name: "Savings".to_string(),
        };
        let result = delete_category(env.config(), args).await;

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(
            err_msg.contains("Cannot delete category 'Savings'"),
            "Expected foreign key error, got: {}",
            err_msg
        );

        // The category survives
        let cat = env.config().db().get_category("Savings").await.unwrap();
        assert!(cat.is_some());
    }

    #[tokio::test]
    async fn test_delete_category_not_found_error() {
        let env = TestEnv::new().await;

        let args = DeleteCategoryArgs {
            name: "Nonexistent".to_string(),
        };
        let result = delete_category(env.config(), args).await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No category named 'Nonexistent'"));
    }

    #[tokio::test]
    async fn test_delete_budget_success() {
        let env = TestEnv::new().await;
        env.insert_test_category("Food").await;
        env.insert_test_budget("Food", "2025-06", Decimal::new(40000, 2))
            .await;

        let args = DeleteBudgetArgs {
            category: "Food".to_string(),
            month: "2025-06".to_string(),
        };
        let out = delete_budget(env.config(), args).await.unwrap();
        assert!(out.message().contains("Deleted the budget for 'Food' in 2025-06"));

        let budgets = env.config().db().list_budgets(None).await.unwrap();
        assert!(budgets.is_empty());
    }

    #[tokio::test]
    async fn test_delete_goal_success() {
        let env = TestEnv::new().await;
        env.insert_test_category("Savings").await;
        env.insert_test_goal("Emergency Fund", "Savings").await;

        let args = DeleteGoalArgs {
            name: "Emergency Fund".to_string(),
        };
        let out = delete_goal(env.config(), args).await.unwrap();
        assert!(out.message().contains("Deleted goal: Emergency Fund"));

        let goal = env.config().db().get_goal("Emergency Fund").await.unwrap();
        assert!(goal.is_none());
    }

    #[tokio::test]
    async fn test_delete_trade_not_found_error() {
        let env = TestEnv::new().await;

        let args = DeleteTradeArgs {
            id: "trd-missing".to_string(),
        };
        let result = delete_trade(env.config(), args).await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No trade found with ID 'trd-missing'"));
    }
}
