//! SQLite backend for the daypick identity and daily-pick stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every operation is a single statement
//! or a single transaction inside one `call`, so concurrent requests cannot
//! interleave inside a write.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
