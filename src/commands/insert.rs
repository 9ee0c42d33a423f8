//! Insert command handlers.

use crate::args::{
    InsertBudgetArgs, InsertCategoryArgs, InsertGoalArgs, InsertTradeArgs, InsertTransactionArgs,
};
use crate::commands::Out;
use crate::model::{Budget, Category, Goal, Trade, Transaction};
use crate::utils;
use crate::{Config, Result};
use anyhow::bail;

/// Inserts a new transaction into the book, optionally split into monthly installments.
///
/// A unique transaction ID is automatically generated with a `txn-` prefix. With
/// `--installments N` the amount is divided across N rows, one calendar month apart, and all
/// rows are written in a single database transaction.
///
/// # Arguments
///
/// - `config` - The application configuration containing the database connection.
/// - `args` - The transaction data to insert. `date` and `amount` are required; all other fields
///   are optional.
///
/// # Returns
///
/// On success, returns an `Out` containing:
/// - A message indicating the transaction was inserted.
/// - The generated transaction IDs, in installment order.
///
/// # Errors
///
/// - Returns an error if a database operation fails.
/// - Returns an error if the specified category does not exist (foreign key constraint).
/// - Returns an error if the installment count is out of range.
pub async fn insert_transaction(
    config: Config,
    args: InsertTransactionArgs,
) -> Result<Out<Vec<String>>> {
    // Build the Transaction object from args
    let transaction = Transaction {
        transaction_id: utils::new_transaction_id(),
        date: args.date,
        description: args.description.unwrap_or_default(),
        amount: args.amount,
        account: args.account.unwrap_or_default(),
        category: args.category.clone().filter(|c| !c.is_empty()),
        note: args.note.unwrap_or_default(),
        tags: args.tags.unwrap_or_default(),
        fingerprint: None,
        date_added: utils::today(),
    };

    let transactions = transaction.split_installments(args.installments)?;
    let ids: Vec<String> = transactions
        .iter()
        .map(|t| t.transaction_id.clone())
        .collect();

    // Insert into database
    config
        .db()
        .insert_transactions(&transactions)
        .await
        .map_err(|e| {
            // Check if this is a foreign key constraint error
            let err_str = e.to_string();
            if err_str.contains("FOREIGN KEY constraint failed") {
                anyhow::anyhow!(
                    "Cannot insert transaction: category '{}' does not exist. \
                     Create the category first or leave the category field empty.",
                    args.category.as_deref().unwrap_or("")
                )
            } else {
                e
            }
        })?;

    let message = match ids.as_slice() {
        [id] => format!("Inserted transaction with ID: {id}"),
        _ => format!("Inserted {} installment transactions", ids.len()),
    };
    Ok(Out::new(message, ids))
}

/// Inserts a new category into the book.
///
/// The category name is the primary key and must be unique. The name is returned on success.
///
/// # Errors
///
/// - Returns an error if a category with the same name already exists.
/// - Returns an error if a database operation fails.
pub async fn insert_category(config: Config, args: InsertCategoryArgs) -> Result<Out<String>> {
    // Build the Category object from args
    let category = Category {
        name: args.name.clone(),
        category_group: args.category_group.unwrap_or_default(),
        kind: args.kind,
        hidden: args.hidden,
    };

    // Insert into database
    config
        .db()
        .insert_category(&category)
        .await
        .map_err(|e| {
            // Check if this is a unique constraint error
            let err_str = e.to_string();
            if err_str.contains("UNIQUE constraint failed") {
                anyhow::anyhow!("Cannot insert category: '{}' already exists.", args.name)
            } else {
                e
            }
        })?;

    let message = format!("Inserted category: {}", args.name);
    Ok(Out::new(message, args.name))
}

/// Inserts a budget row: a planned amount for one category in one month.
///
/// # Errors
///
/// - Returns an error if the amount is negative.
/// - Returns an error if the category and month already have a budget.
/// - Returns an error if the specified category does not exist (foreign key constraint).
pub async fn insert_budget(config: Config, args: InsertBudgetArgs) -> Result<Out<Budget>> {
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

    config.db().insert_budget(&budget).await.map_err(|e| {
        let err_str = e.to_string();
        if err_str.contains("UNIQUE constraint failed") {
            anyhow::anyhow!(
                "Cannot insert budget: '{}' already has a budget for {}. \
                 Use `penny update budget` to change it.",
                budget.category,
                budget.month
            )
        } else if err_str.contains("FOREIGN KEY constraint failed") {
            anyhow::anyhow!(
                "Cannot insert budget: category '{}' does not exist. Create the category first.",
                budget.category
            )
        } else {
            e
        }
    })?;

    let message = format!(
        "Inserted a budget of {} for '{}' in {}",
        budget.amount, budget.category, budget.month
    );
    Ok(Out::new(message, budget))
}

/// Inserts a savings goal funded by a category.
///
/// # Errors
///
/// - Returns an error if the target amount is not greater than zero.
/// - Returns an error if a goal with the same name already exists.
/// - Returns an error if the specified category does not exist (foreign key constraint).
pub async fn insert_goal(config: Config, args: InsertGoalArgs) -> Result<Out<String>> {
    if !args.target_amount.is_positive() {
        bail!(
            "A goal's target amount must be greater than zero, got {}",
            args.target_amount.plain()
        );
    }

    let goal = Goal {
        name: args.name.clone(),
        target_amount: args.target_amount,
        target_date: args.target_date,
        category: args.category.clone(),
        created_date: utils::today(),
    };

    config.db().insert_goal(&goal).await.map_err(|e| {
        let err_str = e.to_string();
        if err_str.contains("UNIQUE constraint failed") {
            anyhow::anyhow!("Cannot insert goal: '{}' already exists.", args.name)
        } else if err_str.contains("FOREIGN KEY constraint failed") {
            anyhow::anyhow!(
                "Cannot insert goal: category '{}' does not exist. Create the category first.",
                args.category
            )
        } else {
            e
        }
    })?;

    let message = format!("Inserted goal: {}", args.name);
    Ok(Out::new(message, args.name))
}

/// Inserts a buy or sell trade. The symbol is stored uppercase so that `VTI` and `vti`
/// replay into the same position.
///
/// # Errors
///
/// - Returns an error if the trade fails validation (blank symbol, non-positive quantity,
///   negative price or fees).
/// - Returns an error if a database operation fails.
pub async fn insert_trade(config: Config, args: InsertTradeArgs) -> Result<Out<String>> {
    let trade_id = utils::new_trade_id();
    let trade = Trade {
        trade_id: trade_id.clone(),
        date: args.date,
        symbol: args.symbol.trim().to_uppercase(),
        side: args.side,
        quantity: args.quantity,
        price: args.price,
        fees: args.fees,
        note: args.note.unwrap_or_default(),
    };
    trade.validate()?;

    config.db().insert_trade(&trade).await?;

    let message = format!("Inserted trade with ID: {trade_id}");
    Ok(Out::new(message, trade_id))
}
