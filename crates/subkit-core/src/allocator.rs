//! Subscriber identity allocation.

use uuid::Uuid;

/// Upper bound on draws per create.
pub const MAX_DRAWS: usize = 64;

/// Source of fresh subscriber ids.
///
/// Stores call this once per create and re-draw if the result collides with
/// a live or retired id, so implementations need not track history. A create
/// gives up with [`Error::AllocatorExhausted`] after [`MAX_DRAWS`] collisions.
///
/// [`Error::AllocatorExhausted`]: crate::Error::AllocatorExhausted
pub trait IdAllocator: Send + Sync {
  fn allocate(&self) -> Uuid;
}

/// Draws random version-4 UUIDs from the OS entropy source.
///
/// An entropy failure panics inside `getrandom`; there is no recovery path.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAllocator;

impl IdAllocator for RandomAllocator {
  fn allocate(&self) -> Uuid { Uuid::new_v4() }
}
