//! The `SubscriberStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `subkit-store-sqlite`,
//! or [`crate::memory::MemoryStore`]). Higher layers (`subkit-api`) depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::subscriber::{Deletion, Subscriber};

/// Abstraction over a subscriber store backend.
///
/// Mutations are mutually exclusive and linearizable with respect to reads:
/// a reader observes either the state before or after any concurrent
/// `create`/`delete`, never anything in between.
///
/// Identifiers are never recycled. Once deleted, an id stays retired for the
/// lifetime of the store and `create` will not hand it out again.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SubscriberStore: Send + Sync {
  /// Storage failures only; a missing record is never an error.
  type Error: std::error::Error + Send + Sync + 'static;

  /// Allocate an id, persist `{id, label, created_at}` and return the record.
  ///
  /// The record is visible to every read that starts after this resolves.
  fn create(
    &self,
    label: String,
  ) -> impl Future<Output = Result<Subscriber, Self::Error>> + Send + '_;

  /// Retrieve a subscriber by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscriber>, Self::Error>> + Send + '_;

  /// All live subscribers in insertion order, as of a single point in time.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<Subscriber>, Self::Error>> + Send + '_;

  /// Remove a subscriber and retire its id.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Deletion, Self::Error>> + Send + '_;
}
