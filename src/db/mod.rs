//! This module is responsible for reading, writing and managing the SQLite database

mod migrations;

use crate::model::{
    Amount, Book, Budget, Category, CategoryKind, Goal, Job, JobKind, Trade, TradeSide,
    Transaction,
};
use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Row filters for listing transactions. All fields are ANDed together.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub(crate) struct TransactionFilter {
    /// Restrict to dates on or after this day.
    pub(crate) from: Option<NaiveDate>,
    /// Restrict to dates on or before this day.
    pub(crate) to: Option<NaiveDate>,
    /// Restrict to one month, `YYYY-MM`.
    pub(crate) month: Option<String>,
    /// Restrict to one category name.
    pub(crate) category: Option<String>,
    /// Restrict to one account name.
    pub(crate) account: Option<String>,
    /// Restrict to descriptions containing this text, case-insensitively.
    pub(crate) search: Option<String>,
    /// Return at most this many rows.
    pub(crate) limit: Option<u32>,
}

/// A handle to the book's SQLite database.
#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!(
                "No database found at '{}', run 'penny init' first",
                path.display()
            );
        }
        let pool = connect(path, false).await?;
        let current = schema_version(&pool).await?;
        migrations::run(&pool, current, migrations::LATEST_VERSION).await?;
        Ok(Self { pool })
    }

    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;

        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to insert initial schema version")?;

        migrations::run(&pool, 0, migrations::LATEST_VERSION).await?;
        Ok(Self { pool })
    }

    // ==================== categories ====================

    pub(crate) async fn insert_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (name, category_group, kind, hidden) VALUES (?, ?, ?, ?)",
        )
        .bind(&category.name)
        .bind(&category.category_group)
        .bind(category.kind.to_string())
        .bind(category.hidden)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn get_category(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query category")?;
        row.as_ref().map(category_from_row).transpose()
    }

    pub(crate) async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories ORDER BY category_group, name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;
        rows.iter().map(category_from_row).collect()
    }

    /// Writes all fields of `category` over the row currently named `name`. A rename
    /// cascades to transactions, budgets and goals through the schema's foreign keys.
    pub(crate) async fn update_category(&self, name: &str, category: &Category) -> Result<()> {
        let result = sqlx::query(
            "UPDATE categories SET name = ?, category_group = ?, kind = ?, hidden = ? WHERE name = ?",
        )
        .bind(&category.name)
        .bind(&category.category_group)
        .bind(category.kind.to_string())
        .bind(category.hidden)
        .bind(name)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            bail!("No category named '{name}'");
        }
        Ok(())
    }

    pub(crate) async fn delete_category(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("No category named '{name}'");
        }
        Ok(())
    }

    // ==================== transactions ====================

    /// Inserts all the given rows in a single database transaction. Used by installment
    /// splitting and statement import so a failure part-way leaves nothing behind.
    pub(crate) async fn insert_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        for transaction in transactions {
            bind_transaction(sqlx::query(INSERT_TRANSACTION_SQL), transaction)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    pub(crate) async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let row = sqlx::query("SELECT * FROM transactions WHERE transaction_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query transaction")?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    /// Rows come back newest first (date descending, ties broken by id).
    pub(crate) async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut sql = String::from("SELECT * FROM transactions");
        let mut clauses = Vec::new();
        if filter.from.is_some() {
            clauses.push("date >= ?");
        }
        if filter.to.is_some() {
            clauses.push("date <= ?");
        }
        if filter.month.is_some() {
            clauses.push("substr(date, 1, 7) = ?");
        }
        if filter.category.is_some() {
            clauses.push("category = ?");
        }
        if filter.account.is_some() {
            clauses.push("account = ?");
        }
        if filter.search.is_some() {
            // instr instead of LIKE so needles containing % or _ need no escaping.
            clauses.push("instr(lower(description), ?) > 0");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date DESC, transaction_id");
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(from) = filter.from {
            query = query.bind(from.to_string());
        }
        if let Some(to) = filter.to {
            query = query.bind(to.to_string());
        }
        if let Some(month) = &filter.month {
            query = query.bind(month);
        }
        if let Some(category) = &filter.category {
            query = query.bind(category);
        }
        if let Some(account) = &filter.account {
            query = query.bind(account);
        }
        if let Some(search) = &filter.search {
            query = query.bind(search.to_lowercase());
        }
        if let Some(limit) = filter.limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;
        rows.iter().map(transaction_from_row).collect()
    }

    /// Writes all fields of each row over the row with the same `transaction_id`, in a single
    /// database transaction. An unknown id fails the whole batch.
    pub(crate) async fn update_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        for transaction in transactions {
            let result = bind_transaction(sqlx::query(UPDATE_TRANSACTION_SQL), transaction)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                bail!(
                    "No transaction found with ID '{}'",
                    transaction.transaction_id
                );
            }
        }
        tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    /// Deletes the rows with the given ids, in a single database transaction. An unknown id
    /// fails the whole batch.
    pub(crate) async fn delete_transactions(&self, ids: &[String]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        for id in ids {
            let result = sqlx::query("DELETE FROM transactions WHERE transaction_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                bail!("No transaction found with ID '{id}'");
            }
        }
        tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    /// Returns every stored import fingerprint, for deduplicating statement imports.
    pub(crate) async fn existing_fingerprints(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT fingerprint FROM transactions WHERE fingerprint IS NOT NULL")
                .fetch_all(&self.pool)
                .await
                .context("Failed to query fingerprints")?;
        Ok(rows.into_iter().map(|(fp,)| fp).collect())
    }

    // ==================== budgets ====================

    pub(crate) async fn insert_budget(&self, budget: &Budget) -> Result<()> {
        sqlx::query("INSERT INTO budgets (category, month, amount) VALUES (?, ?, ?)")
            .bind(&budget.category)
            .bind(&budget.month)
            .bind(budget.amount.plain())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Changes the amount of an existing budget row.
    pub(crate) async fn update_budget(&self, budget: &Budget) -> Result<()> {
        let result = sqlx::query("UPDATE budgets SET amount = ? WHERE category = ? AND month = ?")
            .bind(budget.amount.plain())
            .bind(&budget.category)
            .bind(&budget.month)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!(
                "No budget found for '{}' in {}",
                budget.category,
                budget.month
            );
        }
        Ok(())
    }

    pub(crate) async fn list_budgets(&self, month: Option<&str>) -> Result<Vec<Budget>> {
        let rows = match month {
            Some(month) => {
                sqlx::query("SELECT * FROM budgets WHERE month = ? ORDER BY month, category")
                    .bind(month)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM budgets ORDER BY month, category")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Failed to list budgets")?;
        rows.iter().map(budget_from_row).collect()
    }

    pub(crate) async fn delete_budget(&self, category: &str, month: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM budgets WHERE category = ? AND month = ?")
            .bind(category)
            .bind(month)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("No budget found for '{category}' in {month}");
        }
        Ok(())
    }

    // ==================== goals ====================

    pub(crate) async fn insert_goal(&self, goal: &Goal) -> Result<()> {
        sqlx::query(
            "INSERT INTO goals (name, target_amount, target_date, category, created_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&goal.name)
        .bind(goal.target_amount.plain())
        .bind(goal.target_date.map(|d| d.to_string()))
        .bind(&goal.category)
        .bind(goal.created_date.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn get_goal(&self, name: &str) -> Result<Option<Goal>> {
        let row = sqlx::query("SELECT * FROM goals WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query goal")?;
        row.as_ref().map(goal_from_row).transpose()
    }

    pub(crate) async fn list_goals(&self) -> Result<Vec<Goal>> {
        let rows = sqlx::query("SELECT * FROM goals ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list goals")?;
        rows.iter().map(goal_from_row).collect()
    }

    pub(crate) async fn update_goal(&self, goal: &Goal) -> Result<()> {
        let result = sqlx::query(
            "UPDATE goals SET target_amount = ?, target_date = ?, category = ? WHERE name = ?",
        )
        .bind(goal.target_amount.plain())
        .bind(goal.target_date.map(|d| d.to_string()))
        .bind(&goal.category)
        .bind(&goal.name)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            bail!("No goal named '{}'", goal.name);
        }
        Ok(())
    }

    pub(crate) async fn delete_goal(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM goals WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("No goal named '{name}'");
        }
        Ok(())
    }

    // ==================== trades ====================

    pub(crate) async fn insert_trade(&self, trade: &Trade) -> Result<()> {
        sqlx::query(
            "INSERT INTO trades (trade_id, date, symbol, side, quantity, price, fees, note) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&trade.trade_id)
        .bind(trade.date.to_string())
        .bind(&trade.symbol)
        .bind(trade.side.to_string())
        .bind(trade.quantity.to_string())
        .bind(trade.price.to_string())
        .bind(trade.fees.to_string())
        .bind(&trade.note)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Lists trades in replay order: by date, ties broken by insertion order.
    pub(crate) async fn list_trades(&self, symbol: Option<&str>) -> Result<Vec<Trade>> {
        let rows = match symbol {
            Some(symbol) => {
                sqlx::query("SELECT * FROM trades WHERE symbol = ? ORDER BY date, rowid")
                    .bind(symbol)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM trades ORDER BY date, rowid")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Failed to list trades")?;
        rows.iter().map(trade_from_row).collect()
    }

    pub(crate) async fn delete_trade(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM trades WHERE trade_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("No trade found with ID '{id}'");
        }
        Ok(())
    }

    // ==================== properties ====================

    pub(crate) async fn set_property(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO properties (key, value) VALUES (?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub(crate) async fn get_property(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM properties WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query property")?;
        Ok(row.map(|(value,)| value))
    }

    pub(crate) async fn list_properties(&self) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM properties ORDER BY key")
                .fetch_all(&self.pool)
                .await
                .context("Failed to list properties")?;
        Ok(rows)
    }

    pub(crate) async fn delete_property(&self, key: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM properties WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("No property named '{key}'");
        }
        Ok(())
    }

    // ==================== jobs ====================

    /// Inserts an enabled job and returns its generated ID.
    pub(crate) async fn insert_job(&self, kind: JobKind, day_of_month: u32) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO jobs (kind, day_of_month, last_run, enabled) VALUES (?, ?, NULL, 1)",
        )
        .bind(kind.to_string())
        .bind(i64::from(day_of_month))
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub(crate) async fn get_job(&self, id: i64) -> Result<Option<Job>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE job_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query job")?;
        row.as_ref().map(job_from_row).transpose()
    }

    pub(crate) async fn list_jobs(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query("SELECT * FROM jobs ORDER BY job_id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list jobs")?;
        rows.iter().map(job_from_row).collect()
    }

    pub(crate) async fn update_job(&self, job: &Job) -> Result<()> {
        let result = sqlx::query(
            "UPDATE jobs SET kind = ?, day_of_month = ?, last_run = ?, enabled = ? WHERE job_id = ?",
        )
        .bind(job.kind.to_string())
        .bind(i64::from(job.day_of_month))
        .bind(job.last_run.map(|d| d.to_string()))
        .bind(job.enabled)
        .bind(job.job_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            bail!("No job found with ID {}", job.job_id);
        }
        Ok(())
    }

    pub(crate) async fn delete_job(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE job_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("No job found with ID {id}");
        }
        Ok(())
    }

    // ==================== whole book ====================

    /// Reads every row set, for backups and whole-book exports.
    pub(crate) async fn book(&self) -> Result<Book> {
        Ok(Book {
            categories: self.list_categories().await?,
            transactions: self
                .list_transactions(&TransactionFilter::default())
                .await?,
            budgets: self.list_budgets(None).await?,
            goals: self.list_goals().await?,
            trades: self.list_trades(None).await?,
        })
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .with_context(|| {
            format!(
                "Failed to parse SQLite connection string for '{}'",
                path.display()
            )
        })?
        .create_if_missing(create)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open SQLite database at '{}'", path.display()))?;
    Ok(pool)
}

async fn schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to read the database schema version")?;
    Ok(row.0)
}

const INSERT_TRANSACTION_SQL: &str =
    "INSERT INTO transactions (date, description, amount, account, category, note, tags, \
     fingerprint, date_added, transaction_id) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_TRANSACTION_SQL: &str =
    "UPDATE transactions SET date = ?, description = ?, amount = ?, account = ?, category = ?, \
     note = ?, tags = ?, fingerprint = ?, date_added = ? WHERE transaction_id = ?";

/// Binds a transaction's fields in the order shared by the insert and update statements,
/// with the key (`transaction_id`) last.
fn bind_transaction<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    transaction: &'q Transaction,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(transaction.date.to_string())
        .bind(&transaction.description)
        .bind(transaction.amount.plain())
        .bind(&transaction.account)
        .bind(&transaction.category)
        .bind(&transaction.note)
        .bind(&transaction.tags)
        .bind(&transaction.fingerprint)
        .bind(transaction.date_added.to_string())
        .bind(&transaction.transaction_id)
}

fn parse_db_date(s: &str) -> Result<NaiveDate> {
    s.parse::<NaiveDate>()
        .with_context(|| format!("Invalid date '{s}' in database"))
}

fn parse_db_amount(s: &str) -> Result<Amount> {
    let value =
        Decimal::from_str(s).with_context(|| format!("Invalid amount '{s}' in database"))?;
    Ok(Amount::new(value))
}

fn parse_db_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("Invalid number '{s}' in database"))
}

fn category_from_row(row: &SqliteRow) -> Result<Category> {
    let kind: String = row.try_get("kind")?;
    Ok(Category {
        name: row.try_get("name")?,
        category_group: row.try_get("category_group")?,
        kind: CategoryKind::from_str(&kind)
            .with_context(|| format!("Invalid category kind '{kind}' in database"))?,
        hidden: row.try_get("hidden")?,
    })
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction> {
    let date: String = row.try_get("date")?;
    let amount: String = row.try_get("amount")?;
    let date_added: String = row.try_get("date_added")?;
    Ok(Transaction {
        transaction_id: row.try_get("transaction_id")?,
        date: parse_db_date(&date)?,
        description: row.try_get("description")?,
        amount: parse_db_amount(&amount)?,
        account: row.try_get("account")?,
        category: row.try_get("category")?,
        note: row.try_get("note")?,
        tags: row.try_get("tags")?,
        fingerprint: row.try_get("fingerprint")?,
        date_added: parse_db_date(&date_added)?,
    })
}

fn budget_from_row(row: &SqliteRow) -> Result<Budget> {
    let amount: String = row.try_get("amount")?;
    Ok(Budget {
        category: row.try_get("category")?,
        month: row.try_get("month")?,
        amount: parse_db_amount(&amount)?,
    })
}

fn goal_from_row(row: &SqliteRow) -> Result<Goal> {
    let target_amount: String = row.try_get("target_amount")?;
    let target_date: Option<String> = row.try_get("target_date")?;
    let created_date: String = row.try_get("created_date")?;
    Ok(Goal {
        name: row.try_get("name")?,
        target_amount: parse_db_amount(&target_amount)?,
        target_date: target_date.as_deref().map(parse_db_date).transpose()?,
        category: row.try_get("category")?,
        created_date: parse_db_date(&created_date)?,
    })
}

fn trade_from_row(row: &SqliteRow) -> Result<Trade> {
    let date: String = row.try_get("date")?;
    let side: String = row.try_get("side")?;
    let quantity: String = row.try_get("quantity")?;
    let price: String = row.try_get("price")?;
    let fees: String = row.try_get("fees")?;
    Ok(Trade {
        trade_id: row.try_get("trade_id")?,
        date: parse_db_date(&date)?,
        symbol: row.try_get("symbol")?,
        side: TradeSide::from_str(&side)
            .with_context(|| format!("Invalid trade side '{side}' in database"))?,
        quantity: parse_db_decimal(&quantity)?,
        price: parse_db_decimal(&price)?,
        fees: parse_db_decimal(&fees)?,
        note: row.try_get("note")?,
    })
}

fn job_from_row(row: &SqliteRow) -> Result<Job> {
    let kind: String = row.try_get("kind")?;
    let day_of_month: i64 = row.try_get("day_of_month")?;
    let last_run: Option<String> = row.try_get("last_run")?;
    Ok(Job {
        job_id: row.try_get("job_id")?,
        kind: JobKind::from_str(&kind)
            .with_context(|| format!("Invalid job kind '{kind}' in database"))?,
        day_of_month: u32::try_from(day_of_month)
            .with_context(|| format!("Invalid job day {day_of_month} in database"))?,
        last_run: last_run.as_deref().map(parse_db_date).transpose()?,
        enabled: row.try_get("enabled")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{new_trade_id, new_transaction_id};
    use tempfile::TempDir;

    async fn test_db() -> (TempDir, Db) {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::init(temp_dir.path().join("book.sqlite")).await.unwrap();
        (temp_dir, db)
    }

    fn category(name: &str) -> Category {
        Category {
            name: name.to_string(),
            category_group: "Living".to_string(),
            kind: CategoryKind::Expense,
            hidden: false,
        }
    }

    fn transaction(category: Option<&str>) -> Transaction {
        Transaction {
            transaction_id: new_transaction_id(),
            date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            description: "Corner Store".to_string(),
            amount: Amount::new(Decimal::new(-1250, 2)),
            account: "Checking".to_string(),
            category: category.map(|c| c.to_string()),
            note: String::new(),
            tags: String::new(),
            fingerprint: None,
            date_added: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_init_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("book.sqlite");
        let _ = Db::init(&path).await.unwrap();
        let _ = Db::load(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("book.sqlite");
        let _ = Db::init(&path).await.unwrap();
        let err = Db::init(&path).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_load_requires_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = Db::load(temp_dir.path().join("missing.sqlite"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("penny init"));
    }

    #[tokio::test]
    async fn test_category_round_trip() {
        let (_temp_dir, db) = test_db().await;
        db.insert_category(&category("Groceries")).await.unwrap();

        let fetched = db.get_category("Groceries").await.unwrap().unwrap();
        assert_eq!(fetched, category("Groceries"));
        assert!(db.get_category("Nope").await.unwrap().is_none());

        let duplicate = db.insert_category(&category("Groceries")).await;
        assert!(duplicate
            .unwrap_err()
            .to_string()
            .contains("UNIQUE constraint failed"));
    }

    #[tokio::test]
    async fn test_rename_category_cascades() {
        let (_temp_dir, db) = test_db().await;
        db.insert_category(&category("Groceries")).await.unwrap();
        db.insert_transactions(&[transaction(Some("Groceries"))])
            .await
            .unwrap();
        db.insert_budget(&Budget {
            category: "Groceries".to_string(),
            month: "2025-06".to_string(),
            amount: Amount::new(Decimal::new(50000, 2)),
        })
        .await
        .unwrap();

        let mut renamed = category("Groceries");
        renamed.name = "Food".to_string();
        db.update_category("Groceries", &renamed).await.unwrap();

        let transactions = db
            .list_transactions(&TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(transactions[0].category.as_deref(), Some("Food"));
        let budgets = db.list_budgets(None).await.unwrap();
        assert_eq!(budgets[0].category, "Food");
    }

    #[tokio::test]
    async fn test_delete_category_clears_transactions() {
        let (_temp_dir, db) = test_db().await;
        db.insert_category(&category("Groceries")).await.unwrap();
        db.insert_transactions(&[transaction(Some("Groceries"))])
            .await
            .unwrap();

        db.delete_category("Groceries").await.unwrap();

        let transactions = db
            .list_transactions(&TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(transactions[0].category, None);
    }

    #[tokio::test]
    async fn test_delete_category_funding_goal_is_restricted() {
        let (_temp_dir, db) = test_db().await;
        db.insert_category(&category("Savings")).await.unwrap();
        db.insert_goal(&Goal {
            name: "House Fund".to_string(),
            target_amount: Amount::new(Decimal::new(2000000, 2)),
            target_date: None,
            category: "Savings".to_string(),
            created_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        })
        .await
        .unwrap();

        let err = db.delete_category("Savings").await.unwrap_err();
        assert!(err.to_string().contains("FOREIGN KEY constraint failed"));
    }

    #[tokio::test]
    async fn test_transaction_requires_known_category() {
        let (_temp_dir, db) = test_db().await;
        let err = db
            .insert_transactions(&[transaction(Some("Nonexistent"))])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("FOREIGN KEY constraint failed"));
    }

    #[tokio::test]
    async fn test_transaction_filters() {
        let (_temp_dir, db) = test_db().await;
        db.insert_category(&category("Groceries")).await.unwrap();

        let mut june = transaction(Some("Groceries"));
        june.account = "Visa".to_string();
        let mut july = transaction(None);
        july.date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        db.insert_transactions(&[june, july]).await.unwrap();

        let by_month = db
            .list_transactions(&TransactionFilter {
                month: Some("2025-06".to_string()),
                ..TransactionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_month.len(), 1);
        assert_eq!(by_month[0].account, "Visa");

        let by_account = db
            .list_transactions(&TransactionFilter {
                account: Some("Checking".to_string()),
                ..TransactionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_account.len(), 1);

        let by_category = db
            .list_transactions(&TransactionFilter {
                category: Some("Groceries".to_string()),
                ..TransactionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_category.len(), 1);
    }

    #[tokio::test]
    async fn test_transaction_range_search_and_limit() {
        let (_temp_dir, db) = test_db().await;
        let mut april = transaction(None);
        april.date = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        april.description = "ACME Web Services".to_string();
        let mut may = transaction(None);
        may.date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        may.description = "Corner Store".to_string();
        let mut june = transaction(None);
        june.date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        june.description = "acme web services".to_string();
        db.insert_transactions(&[april, may, june]).await.unwrap();

        // Newest first.
        let all = db
            .list_transactions(&TransactionFilter::default())
            .await
            .unwrap();
        let dates: Vec<String> = all.iter().map(|t| t.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-06-01", "2025-05-20", "2025-04-10"]);

        let ranged = db
            .list_transactions(&TransactionFilter {
                from: Some(NaiveDate::from_ymd_opt(2025, 4, 15).unwrap()),
                to: Some(NaiveDate::from_ymd_opt(2025, 5, 31).unwrap()),
                ..TransactionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].description, "Corner Store");

        let searched = db
            .list_transactions(&TransactionFilter {
                search: Some("ACME".to_string()),
                ..TransactionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 2);

        let limited = db
            .list_transactions(&TransactionFilter {
                limit: Some(2),
                ..TransactionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].date.to_string(), "2025-06-01");
    }

    #[tokio::test]
    async fn test_batch_insert_is_atomic() {
        let (_temp_dir, db) = test_db().await;
        let mut first = transaction(None);
        first.fingerprint = Some("abc123".to_string());
        let mut second = transaction(None);
        second.fingerprint = Some("abc123".to_string());

        let result = db.insert_transactions(&[first, second]).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("UNIQUE constraint failed"));

        let all = db
            .list_transactions(&TransactionFilter::default())
            .await
            .unwrap();
        assert!(all.is_empty(), "a failed batch must leave nothing behind");
    }

    #[tokio::test]
    async fn test_update_and_delete_transactions() {
        let (_temp_dir, db) = test_db().await;
        let mut txn = transaction(None);
        db.insert_transactions(&[txn.clone()]).await.unwrap();

        txn.note = "split with roommate".to_string();
        db.update_transactions(&[txn.clone()]).await.unwrap();
        let fetched = db
            .get_transaction(&txn.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.note, "split with roommate");

        db.delete_transactions(&[txn.transaction_id.clone()])
            .await
            .unwrap();
        assert!(db
            .get_transaction(&txn.transaction_id)
            .await
            .unwrap()
            .is_none());
        assert!(db
            .delete_transactions(&[txn.transaction_id.clone()])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_batch_delete_is_atomic() {
        let (_temp_dir, db) = test_db().await;
        let txn = transaction(None);
        db.insert_transactions(&[txn.clone()]).await.unwrap();

        let err = db
            .delete_transactions(&[txn.transaction_id.clone(), "txn-missing".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("txn-missing"));

        // The existing row must survive the failed batch.
        assert!(db
            .get_transaction(&txn.transaction_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_existing_fingerprints() {
        let (_temp_dir, db) = test_db().await;
        let mut txn = transaction(None);
        txn.fingerprint = Some("deadbeef00112233".to_string());
        db.insert_transactions(&[txn, transaction(None)]).await.unwrap();

        let fingerprints = db.existing_fingerprints().await.unwrap();
        assert_eq!(fingerprints.len(), 1);
        assert!(fingerprints.contains("deadbeef00112233"));
    }

    #[tokio::test]
    async fn test_budget_insert_update_delete() {
        let (_temp_dir, db) = test_db().await;
        db.insert_category(&category("Groceries")).await.unwrap();

        let mut budget = Budget {
            category: "Groceries".to_string(),
            month: "2025-06".to_string(),
            amount: Amount::new(Decimal::new(50000, 2)),
        };
        db.insert_budget(&budget).await.unwrap();

        let duplicate = db.insert_budget(&budget).await;
        assert!(duplicate
            .unwrap_err()
            .to_string()
            .contains("UNIQUE constraint failed"));

        budget.amount = Amount::new(Decimal::new(60000, 2));
        db.update_budget(&budget).await.unwrap();
        let budgets = db.list_budgets(Some("2025-06")).await.unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount.value(), Decimal::new(60000, 2));

        budget.month = "2025-07".to_string();
        let err = db.update_budget(&budget).await.unwrap_err();
        assert!(err.to_string().contains("2025-07"));

        db.delete_budget("Groceries", "2025-06").await.unwrap();
        assert!(db.list_budgets(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_goal_round_trip() {
        let (_temp_dir, db) = test_db().await;
        db.insert_category(&category("Savings")).await.unwrap();
        let mut goal = Goal {
            name: "House Fund".to_string(),
            target_amount: Amount::new(Decimal::new(2000000, 2)),
            target_date: Some(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()),
            category: "Savings".to_string(),
            created_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        db.insert_goal(&goal).await.unwrap();

        goal.target_amount = Amount::new(Decimal::new(2500000, 2));
        db.update_goal(&goal).await.unwrap();

        let fetched = db.get_goal("House Fund").await.unwrap().unwrap();
        assert_eq!(fetched.target_amount.value(), Decimal::new(2500000, 2));
        assert_eq!(
            fetched.target_date,
            Some(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap())
        );

        db.delete_goal("House Fund").await.unwrap();
        assert!(db.get_goal("House Fund").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trade_round_trip() {
        let (_temp_dir, db) = test_db().await;
        let trade = Trade {
            trade_id: new_trade_id(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            symbol: "VTI".to_string(),
            side: TradeSide::Buy,
            quantity: Decimal::new(105, 1),
            price: Decimal::new(25000, 2),
            fees: Decimal::new(100, 2),
            note: String::new(),
        };
        db.insert_trade(&trade).await.unwrap();

        let trades = db.list_trades(Some("VTI")).await.unwrap();
        assert_eq!(trades, vec![trade.clone()]);
        assert!(db.list_trades(Some("AAPL")).await.unwrap().is_empty());

        db.delete_trade(&trade.trade_id).await.unwrap();
        assert!(db.list_trades(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_properties() {
        let (_temp_dir, db) = test_db().await;
        assert!(db.get_property("email.to").await.unwrap().is_none());

        db.set_property("email.to", "me@example.com").await.unwrap();
        db.set_property("email.to", "you@example.com")
            .await
            .unwrap();
        assert_eq!(
            db.get_property("email.to").await.unwrap().as_deref(),
            Some("you@example.com")
        );

        db.set_property("currency", "USD").await.unwrap();
        let all = db.list_properties().await.unwrap();
        assert_eq!(
            all,
            vec![
                ("currency".to_string(), "USD".to_string()),
                ("email.to".to_string(), "you@example.com".to_string()),
            ]
        );

        db.delete_property("currency").await.unwrap();
        assert!(db.delete_property("currency").await.is_err());
    }

    #[tokio::test]
    async fn test_job_round_trip() {
        let (_temp_dir, db) = test_db().await;
        let id = db.insert_job(JobKind::EmailSummary, 5).await.unwrap();

        let mut job = db.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.kind, JobKind::EmailSummary);
        assert_eq!(job.day_of_month, 5);
        assert_eq!(job.last_run, None);
        assert!(job.enabled);

        job.last_run = Some(NaiveDate::from_ymd_opt(2025, 6, 5).unwrap());
        job.enabled = false;
        db.update_job(&job).await.unwrap();
        let fetched = db.get_job(id).await.unwrap().unwrap();
        assert_eq!(
            fetched.last_run,
            Some(NaiveDate::from_ymd_opt(2025, 6, 5).unwrap())
        );
        assert!(!fetched.enabled);

        db.delete_job(id).await.unwrap();
        assert!(db.get_job(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_job_day_constraint() {
        let (_temp_dir, db) = test_db().await;
        let err = db.insert_job(JobKind::Backup, 29).await.unwrap_err();
        assert!(err.to_string().contains("CHECK constraint failed"));
    }

    #[tokio::test]
    async fn test_book_snapshot() {
        let (_temp_dir, db) = test_db().await;
        db.insert_category(&category("Groceries")).await.unwrap();
        db.insert_transactions(&[transaction(Some("Groceries"))])
            .await
            .unwrap();
        db.insert_budget(&Budget {
            category: "Groceries".to_string(),
            month: "2025-06".to_string(),
            amount: Amount::new(Decimal::new(50000, 2)),
        })
        .await
        .unwrap();

        let book = db.book().await.unwrap();
        assert_eq!(book.categories.len(), 1);
        assert_eq!(book.transactions.len(), 1);
        assert_eq!(book.budgets.len(), 1);
        assert!(book.goals.is_empty());
        assert!(book.trades.is_empty());
    }
}
