//! Learning content catalog: topics and the content items attached to them.

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
