use std::time::Duration;

use anyhow::{anyhow, Context};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::config::AppConfig;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const DEFAULT_MAX_POOL_SIZE: u32 = 2;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the connection pool described by `config`. A configured size of
/// zero is raised to one connection.
pub fn init_pool(config: &AppConfig) -> anyhow::Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    Pool::builder()
        .max_size(config.database_max_pool_size.max(1))
        .connection_timeout(CONNECTION_TIMEOUT)
        .build(manager)
        .with_context(|| format!("failed to connect to {}", config.redacted_database_url()))
}

/// Applies every embedded migration that has not run yet and returns how many ran.
pub fn run_migrations(conn: &mut PgConnection) -> anyhow::Result<usize> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
    tracing::info!(
        component = "db",
        applied = applied.len(),
        "database migrations complete"
    );
    Ok(applied.len())
}
