use std::env;

use anyhow::{Context, Result};
use url::Url;

use crate::db::DEFAULT_MAX_POOL_SIZE;

pub const DEFAULT_TOKEN_EXPIRY_SECONDS: i64 = 3600;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_pool_size: u32,
    pub secret_key: String,
    pub token_issuer: String,
    pub token_audience: String,
    pub token_expiry_seconds: i64,
    /// Users registering with this address receive the administrator role.
    pub admin_email: Option<String>,
    pub api_base_url: Url,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let secret_key = env::var("SECRET_KEY").context("SECRET_KEY must be set")?;
        let token_issuer = env::var("TOKEN_ISSUER").unwrap_or_else(|_| "socialblog".to_string());
        let token_audience =
            env::var("TOKEN_AUDIENCE").unwrap_or_else(|_| "socialblog-clients".to_string());
        let token_expiry_seconds = env::var("TOKEN_EXPIRY_SECONDS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_EXPIRY_SECONDS.to_string())
            .parse()
            .context("TOKEN_EXPIRY_SECONDS must be an integer")?;
        let admin_email = env::var("ADMIN_EMAIL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let api_base_url = parse_base_url(
            &env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api/v1/".to_string()),
        )?;

        Ok(Self {
            database_url,
            database_max_pool_size,
            secret_key,
            token_issuer,
            token_audience,
            token_expiry_seconds,
            admin_email,
            api_base_url,
        })
    }

    pub fn redacted_database_url(&self) -> String {
        redact_database_url(&self.database_url)
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin.trim().eq_ignore_ascii_case(email.trim()))
    }
}

/// Parses the API base URL, forcing a trailing slash so relative joins
/// append to the path instead of replacing its last segment.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut value = raw.trim().to_string();
    if !value.ends_with('/') {
        value.push('/');
    }
    Url::parse(&value).context("API_BASE_URL must be a valid URL")
}

fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("*****"));
            }
            parsed.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
