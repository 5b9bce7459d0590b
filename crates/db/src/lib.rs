//! SQLite connection pool with an explicit open/close lifecycle.
//!
//! The pool is constructed once at startup, handed to whatever needs it, and
//! closed after the HTTP server has drained. Module migrations are applied
//! through [`Database::apply_migrations`] and recorded so reruns are no-ops.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use bookstore_kernel::settings::DatabaseSettings;
use bookstore_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Handle to the service database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool against the configured database URL.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let in_memory = settings.url.contains(":memory:");

        let mut connect_opts = SqliteConnectOptions::from_str(&settings.url)
            .with_context(|| format!("invalid database url '{}'", settings.url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .disable_statement_logging();
        if !in_memory {
            connect_opts = connect_opts.journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool_opts = SqlitePoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms));
        if in_memory {
            // Every connection to `:memory:` is a separate database.
            pool_opts = pool_opts
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_opts
            .connect_with(connect_opts)
            .await
            .with_context(|| format!("failed to open database '{}'", settings.url))?;

        tracing::info!(target: "bookstore-db", url = %settings.url, "database pool opened");

        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests.
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::connect(&DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            ..DatabaseSettings::default()
        })
        .await
    }

    /// Apply migrations in the given order, skipping those already recorded.
    ///
    /// Each migration runs in its own transaction together with its record.
    pub async fn apply_migrations(&self, migrations: &[(String, Migration)]) -> anyhow::Result<()> {
        sqlx::query(MIGRATIONS_TABLE)
            .execute(&self.pool)
            .await
            .context("failed to create migrations table")?;

        for (module, migration) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                    .bind(module)
                    .bind(migration.id)
                    .fetch_optional(&self.pool)
                    .await
                    .context("failed to read migration history")?;

            if applied.is_some() {
                tracing::debug!(target: "bookstore-db", %module, id = migration.id, "migration already applied");
                continue;
            }

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
            sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
                .bind(module)
                .bind(migration.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!(target: "bookstore-db", %module, id = migration.id, "migration applied");
        }

        Ok(())
    }

    /// Get reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "bookstore-db", "database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "things".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE things (name TEXT PRIMARY KEY);",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = Database::in_memory().await.unwrap();

        db.apply_migrations(&migrations()).await.unwrap();
        // A second run must not try to recreate the table.
        db.apply_migrations(&migrations()).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn failing_migration_is_not_recorded() {
        let db = Database::in_memory().await.unwrap();
        let broken = vec![(
            "things".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE (;",
            },
        )];

        let err = db.apply_migrations(&broken).await.unwrap_err();
        assert!(err.to_string().contains("things/001_broken"));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn in_memory_state_survives_across_queries() {
        let db = Database::in_memory().await.unwrap();
        db.apply_migrations(&migrations()).await.unwrap();

        sqlx::query("INSERT INTO things (name) VALUES ('a')")
            .execute(db.pool())
            .await
            .unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM things")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await;
        assert!(db.pool().is_closed());
    }
}
