//! Update command handlers.

use crate::args::{UpdateBudgetArgs, UpdateCategoryArgs, UpdateGoalArgs, UpdateTransactionArgs};
use crate::commands::Out;
use crate::model::{Budget, Category, Goal, Transaction};
use crate::{Config, Result};
use anyhow::bail;

/// Updates one or more transactions by ID with the specified field changes.
///
/// The same changes apply to every listed ID, and all rows are written atomically within a
/// database transaction. If any ID is not found, the entire operation is rolled back.
///
/// Passing `--category ""` clears the category.
///
/// # Arguments
///
/// - `config` - The application configuration containing the database connection.
/// - `args` - The transaction IDs and field updates to apply.
///
/// # Returns
///
/// On success, returns an `Out` containing:
/// - A message indicating how many transactions were updated.
/// - A vector of the updated `Transaction` objects.
///
/// # Errors
///
/// - Returns an error if no field updates were given.
/// - Returns an error if any specified transaction ID is not found.
/// - Returns an error if the new category does not exist (foreign key constraint).
pub async fn update_transactions(
    config: Config,
    args: UpdateTransactionArgs,
) -> Result<Out<Vec<Transaction>>> {
    if args.updates.is_empty() {
        bail!("Nothing to update: give at least one field to change");
    }

    let mut updated = Vec::with_capacity(args.ids.len());
    for id in &args.ids {
        let Some(mut transaction) = config.db().get_transaction(id).await? else {
            bail!("No transaction found with ID '{id}'");
        };
        transaction.merge_updates(&args.updates);
        updated.push(transaction);
    }

    config
        .db()
        .update_transactions(&updated)
        .await
        .map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("FOREIGN KEY constraint failed") {
                anyhow::anyhow!(
                    "Cannot update transaction: category '{}' does not exist. \
                     Create the category first or pass an empty category to clear it.",
                    args.updates.category.as_deref().unwrap_or("")
                )
            } else {
                e
            }
        })?;

    let count = updated.len();
    let message = format!(
        "Updated {} transaction{}",
        count,
        if count == 1 { "" } else { "s" }
    );
    Ok(Out::new(message, updated))
}

/// Updates a category by name with the specified field changes.
///
/// The category name is the primary key. To rename a category, provide the current name and
/// include `--rename`. Due to `ON UPDATE CASCADE` foreign key constraints, renaming a category
/// automatically updates all references in transactions, budgets and goals.
///
/// # Errors
///
/// - Returns an error if no field updates were given.
/// - Returns an error if the category is not found.
/// - Returns an error if the rename target already exists.
pub async fn update_category(config: Config, args: UpdateCategoryArgs) -> Result<Out<Category>> {
    if args.updates.is_empty() {
        bail!("Nothing to update: give at least one field to change");
    }

    let Some(mut category) = config.db().get_category(&args.name).await? else {
        bail!("No category named '{}'", args.name);
    };
    category.merge_updates(&args.updates);

    config
        .db()
        .update_category(&args.name, &category)
        .await
        .map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("UNIQUE constraint failed") {
                anyhow::anyhow!("Cannot rename category: '{}' already exists.", category.name)
            } else {
                e
            }
        })?;

    let message = format!("Updated category: {}", category.name);
    Ok(Out::new(message, category))
}

/// Changes the planned amount of an existing budget.
///
/// # Errors
///
/// - Returns an error if the amount is negative.
/// - Returns an error if no budget exists for the category and month.
pub async fn update_budget(config: Config, args: UpdateBudgetArgs) -> Result<Out<Budget>> {
    if args.amount.is_negative() {
        bail!(
            "A budget amount must not be negative, got {}",
            args.amount.plain()
        );
    }

    let budget = Budget {
        category: args.category,
        month: args.month,
        amount: args.amount,
    };
    config.db().update_budget(&budget).await?;

    let message = format!(
        "Updated the budget for '{}' in {} to {}",
        budget.category, budget.month, budget.amount
    );
    Ok(Out::new(message, budget))
}

/// Updates a goal by name with the specified field changes.
///
/// # Errors
///
/// - Returns an error if no field updates were given.
/// - Returns an error if the goal is not found.
/// - Returns an error if the new target amount is not greater than zero.
/// - Returns an error if the new category does not exist (foreign key constraint).
pub async fn update_goal(config: Config, args: UpdateGoalArgs) -> Result<Out<Goal>> {
    if args.updates.is_empty() {
        bail!("Nothing to update: give at least one field to change");
    }

    let Some(mut goal) = config.db().get_goal(&args.name).await? else {
        bail!("No goal named '{}'", args.name);
    };
    goal.merge_updates(&args.updates);

    if !goal.target_amount.is_positive() {
        bail!(
            "A goal's target amount must be greater than zero, got {}",
            goal.target_amount.plain()
        );
    }

    config.db().update_goal(&goal).await.map_err(|e| {
        let err_str = e.to_string();
        if err_str.contains("FOREIGN KEY constraint failed") {
            anyhow::anyhow!(
                "Cannot update goal: category '{}' does not exist. Create the category first.",
                goal.category
            )
        } else {
            e
        }
    })?;

    let message = format!("Updated goal: {}", goal.name);
    Ok(Out::new(message, goal))
}
