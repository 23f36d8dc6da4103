//! Course Catalog Server Library
//!
//! This library exposes the internal modules for the binaries and the end to end tests.

pub mod catalog_store;
pub mod config;
pub mod course;
pub mod error;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use catalog_store::{FullCatalogStore, SqliteCatalogStore};
pub use error::{CatalogError, CatalogResult};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{UserManager, UserRole};
