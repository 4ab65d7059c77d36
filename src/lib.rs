//! Imparo server library.
//!
//! Exposes the internal modules for the binary and the end-to-end tests.

pub mod catalog;
pub mod config;
pub mod recommend;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use catalog::{CatalogStore, SqliteCatalogStore};
pub use recommend::Recommender;
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{FullUserStore, SqliteUserStore, UserManager};
