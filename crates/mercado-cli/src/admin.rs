//! Schema and fixture management commands.

use std::path::Path;

/// Apply pending migrations and report how many ran.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = mercado_db::run_migrations(pool).await?;
    if applied == 0 {
        println!("schema is up to date");
    } else {
        println!("applied {applied} migration(s)");
    }
    Ok(())
}

/// Load a seed file and replace all marketplace data with it.
///
/// Migrations are applied first so a fresh database can be seeded in one
/// step.
///
/// # Errors
///
/// Returns an error if the file is invalid or the database write fails.
pub(crate) async fn run_seed(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let seed = mercado_core::load_seed(path)?;
    mercado_db::run_migrations(pool).await?;
    let summary = mercado_db::seed_marketplace(pool, &seed).await?;

    tracing::info!(path = %path.display(), "seed applied");
    println!(
        "seeded {} sellers, {} buyers, {} products, {} orders from {}",
        summary.sellers,
        summary.buyers,
        summary.products,
        summary.orders,
        path.display()
    );
    Ok(())
}
