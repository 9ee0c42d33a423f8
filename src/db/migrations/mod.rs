//! Schema migrations, embedded at compile time.
//!
//! Each version `NN` is a pair of files in this directory: `migration_NN_up.sql`
//! takes the schema from `NN-1` to `NN` and `migration_NN_down.sql` reverses it.

use anyhow::Context;
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::Result;

/// The schema version a fully migrated database is at.
pub(crate) const LATEST_VERSION: i32 = 1;

struct Migration {
    /// The version the up SQL produces.
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// One step of a migration run: the SQL to execute and the version the
/// database is at once it commits.
struct Step {
    sql: &'static str,
    ends_at: i32,
}

/// Brings the database from `current` to `target`, stepping through every
/// version in between. Each step commits its SQL and the schema_version bump
/// in one transaction.
pub(crate) async fn run(pool: &SqlitePool, current: i32, target: i32) -> Result<()> {
    if current == target {
        debug!("Schema already at version {target}");
        return Ok(());
    }
    // Resolve every step up front so a missing migration cannot strand the
    // database between versions.
    for step in plan(current, target)? {
        debug!("Migrating schema to version {}", step.ends_at);
        apply(pool, step.sql, step.ends_at).await?;
    }
    Ok(())
}

/// Maps out the steps from `current` to `target`, upward or downward.
fn plan(current: i32, target: i32) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    if current < target {
        for version in current + 1..=target {
            steps.push(Step {
                sql: find(version)?.up_sql,
                ends_at: version,
            });
        }
    } else {
        for version in (target + 1..=current).rev() {
            steps.push(Step {
                sql: find(version)?.down_sql,
                ends_at: version - 1,
            });
        }
    }
    Ok(steps)
}

fn find(version: i32) -> Result<&'static Migration> {
    MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("No migration brings the schema to version {version}"))
}

/// Runs one step's SQL and records the new schema version, atomically.
async fn apply(pool: &SqlitePool, sql: &str, version: i32) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    // A migration file holds several statements.
    tx.execute(sql)
        .await
        .context("Failed to execute migration SQL")?;

    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Failed to clear schema_version")?;

    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await
        .context("Failed to record schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")?;

    Ok(())
}
