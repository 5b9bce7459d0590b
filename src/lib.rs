//! Bookstore service library
//!
//! The `books` module and the wiring that assembles it into a running
//! service.

pub mod modules;

use anyhow::Context;
use axum::Router;
use bookstore_db::Database;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// A fully wired service: database open, migrations applied, modules started.
pub struct App {
    pub settings: Settings,
    pub db: Database,
    pub registry: ModuleRegistry,
}

impl App {
    /// Open the configured database and bring every module up.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let db = Database::connect(&settings.database)
            .await
            .context("failed to open database")?;
        Self::with_database(settings, db).await
    }

    /// Bring every module up over an already opened database.
    pub async fn with_database(settings: Settings, db: Database) -> anyhow::Result<Self> {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db);

        db.apply_migrations(&registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;

        let ctx = InitCtx {
            settings: &settings,
        };
        registry.init_modules(&ctx).await?;
        registry.start_modules(&ctx).await?;

        Ok(Self {
            settings,
            db,
            registry,
        })
    }

    pub fn router(&self) -> Router {
        bookstore_http::build_router(&self.registry, &self.settings)
    }

    /// Serve until Ctrl-C or SIGTERM.
    pub async fn serve(&self) -> anyhow::Result<()> {
        bookstore_http::start_server(
            &self.registry,
            &self.settings,
            bookstore_http::shutdown_signal(),
        )
        .await
    }

    /// Stop modules in reverse order, then release the database.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let stopped = self.registry.stop_modules().await;
        self.db.close().await;
        stopped
    }
}
