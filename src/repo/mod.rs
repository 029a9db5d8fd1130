//! Persistence operations, one module per aggregate. Every function takes an
//! explicit connection so callers decide the transaction boundary.

pub mod comments;
pub mod follows;
pub mod likes;
pub mod messages;
pub mod posts;
pub mod roles;
pub mod teams;
pub mod users;
