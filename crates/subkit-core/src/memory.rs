//! [`MemoryStore`]: a non-durable [`SubscriberStore`] for tests and
//! ephemeral deployments.

use std::{
  collections::{BTreeMap, HashMap, HashSet},
  sync::{Arc, PoisonError, RwLock},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error,
  allocator::{IdAllocator, MAX_DRAWS, RandomAllocator},
  store::SubscriberStore,
  subscriber::{Deletion, Subscriber},
};

#[derive(Default)]
struct Inner {
  next_seq: u64,
  /// Insertion sequence → record; iteration order is list order.
  records:  BTreeMap<u64, Subscriber>,
  index:    HashMap<Uuid, u64>,
  retired:  HashSet<Uuid>,
}

/// A subscriber store held entirely in process memory.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct MemoryStore {
  inner:     Arc<RwLock<Inner>>,
  allocator: Arc<dyn IdAllocator>,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  pub fn new() -> Self { Self::with_allocator(RandomAllocator) }

  /// Use `allocator` instead of random UUIDs.
  pub fn with_allocator(allocator: impl IdAllocator + 'static) -> Self {
    Self {
      inner:     Arc::new(RwLock::new(Inner::default())),
      allocator: Arc::new(allocator),
    }
  }
}

impl SubscriberStore for MemoryStore {
  type Error = crate::Error;

  async fn create(&self, label: String) -> Result<Subscriber, Error> {
    // Poisoning is ignored: no mutation below can panic halfway.
    let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

    let id = (0..MAX_DRAWS)
      .map(|_| self.allocator.allocate())
      .find(|candidate| {
        !candidate.is_nil()
          && !inner.index.contains_key(candidate)
          && !inner.retired.contains(candidate)
      })
      .ok_or(Error::AllocatorExhausted(MAX_DRAWS))?;

    let subscriber = Subscriber { id, label, created_at: Utc::now() };
    let seq = inner.next_seq;
    inner.next_seq += 1;
    inner.index.insert(id, seq);
    inner.records.insert(seq, subscriber.clone());

    Ok(subscriber)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Subscriber>, Error> {
    let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
    Ok(
      inner
        .index
        .get(&id)
        .and_then(|seq| inner.records.get(seq))
        .cloned(),
    )
  }

  async fn list(&self) -> Result<Vec<Subscriber>, Error> {
    let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
    Ok(inner.records.values().cloned().collect())
  }

  async fn delete(&self, id: Uuid) -> Result<Deletion, Error> {
    let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    match inner.index.remove(&id) {
      Some(seq) => {
        inner.records.remove(&seq);
        inner.retired.insert(id);
        Ok(Deletion::Deleted)
      }
      None => Ok(Deletion::NotFound),
    }
  }
}
