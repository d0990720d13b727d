//! TutorHub Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Repository implementations of the `tutorhub-core` traits
//!   ([`repository`]), bundled by [`SurrealRepositories`]

mod connection;
mod error;
mod row;
mod schema;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::SurrealRepositories;
pub use schema::{run_migrations, schema_v1};
