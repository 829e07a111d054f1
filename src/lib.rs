//! Library catalog application
//!
//! Wires the catalog modules onto the kernel, database and HTTP crates.

pub mod modules;

pub use modules::books;

use anyhow::Context;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Register modules, create their schema and run their `init` step.
///
/// Safe to call on every startup: migrations and seeding are idempotent.
pub async fn prepare(settings: &Settings, db: &Database) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db);

    let applied = db
        .apply_migrations(&registry.collect_migrations())
        .context("failed to apply migrations")?;
    tracing::info!(applied, "database schema ready");

    let ctx = InitCtx { settings };
    registry
        .init_modules(&ctx)
        .await
        .context("failed to initialize modules")?;

    Ok(registry)
}
