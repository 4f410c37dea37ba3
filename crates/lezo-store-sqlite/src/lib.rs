//! SQLite backend for the Lezo civil registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Deduplication and edge uniqueness are
//! enforced by the schema itself, so concurrent importers cannot slip a
//! duplicate past the application-level checks.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
