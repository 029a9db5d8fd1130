use std::env;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use diesel::connection::SimpleConnection;
use diesel::PgConnection;
use once_cell::sync::Lazy;
use socialblog::auth::jwt::JwtService;
use socialblog::config::{parse_base_url, AppConfig};
use socialblog::db;
use socialblog::models::User;
use socialblog::repo::{roles, users};
use socialblog::state::{AppState, PgPooledConnection};

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const ADMIN_EMAIL: &str = "admin@blog.test";

pub struct TestApp {
    pub state: AppState,
    _lock: MutexGuard<'static, ()>,
}

impl TestApp {
    /// Connects to `TEST_DATABASE_URL`, migrates and empties the schema.
    pub fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;
        let lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let config = AppConfig {
            database_url,
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            secret_key: "test-secret".to_string(),
            token_issuer: "test-issuer".to_string(),
            token_audience: "test-audience".to_string(),
            token_expiry_seconds: 3600,
            admin_email: Some(ADMIN_EMAIL.to_string()),
            api_base_url: parse_base_url("http://localhost:5000/api/v1/")?,
        };

        let pool = db::init_pool(&config)?;
        {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
            db::run_migrations(&mut conn)?;
            truncate_all(&mut conn)?;
        }

        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool, config, jwt);
        Ok(Self { state, _lock: lock })
    }

    pub fn conn(&self) -> Result<PgPooledConnection> {
        self.state
            .db()
            .map_err(|err| anyhow!("failed to get database connection: {err}"))
    }

    pub fn seed_roles(&self) -> Result<()> {
        let mut conn = self.conn()?;
        roles::insert_roles(&mut conn)?;
        Ok(())
    }

    pub fn insert_user(&self, username: &str, password: &str) -> Result<User> {
        let mut conn = self.conn()?;
        let form = users::NewUserForm::new(format!("{username}@blog.test"), username, password);
        let user = users::create_user(&mut conn, &self.state.config, form)
            .with_context(|| format!("failed to insert user {username}"))?;
        Ok(user)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Ok(mut conn) = self.state.pool.get() {
            let _ = truncate_all(&mut conn);
        }
    }
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE team_members, messages, post_content_likes, comment_likes, comments, \
         post_contents, posts, follows, users, roles RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
