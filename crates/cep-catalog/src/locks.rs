//! Per-key async mutual exclusion.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A registry of async mutexes keyed by string.
///
/// The catalog keys it by course-code prefix and holds the guard across the
/// read-then-insert span of sequencing. Entries are never evicted; the key
/// space is bounded by areas × categories.
#[derive(Debug, Default)]
pub struct KeyedLocks {
  slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `key`. Released when the guard drops.
  pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
    let slot = {
      let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
      Arc::clone(slots.entry(key.to_owned()).or_default())
    };
    slot.lock_owned().await
  }
}
