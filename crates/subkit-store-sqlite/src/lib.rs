//! SQLite backend for the subkit subscriber store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That thread executes one closure at a
//! time, which is what makes mutations mutually exclusive and reads
//! linearizable.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
