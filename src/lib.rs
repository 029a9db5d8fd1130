pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod fake;
pub mod models;
pub mod repo;
pub mod schema;
pub mod state;
pub mod utils;

pub use error::{AppError, AppResult};
pub use state::AppState;
