use std::sync::Arc;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
    Connection,
};

use crate::{
    api::ResourceUrls,
    auth::jwt::JwtService,
    config::AppConfig,
    db::PgPool,
    error::{AppError, AppResult},
};

pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Everything an operation needs besides its arguments. Passed explicitly
/// instead of living in process globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub urls: ResourceUrls,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, jwt: JwtService) -> Self {
        let urls = ResourceUrls::new(config.api_base_url.clone());
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            urls,
        }
    }

    pub fn db(&self) -> AppResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::Pool(format!("database pool error: {err}")))
    }

    /// Runs `f` inside a single transaction on a pooled connection; any error
    /// rolls the whole unit of work back.
    pub fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AppResult<T>,
    {
        let mut pooled = self.db()?;
        let conn: &mut PgConnection = &mut pooled;
        conn.transaction(f)
    }
}
