/* src/server/core/rust/src/once.rs */

//! Cross-request memoization for `once` props.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::InertiaError;

#[derive(Debug, Clone, PartialEq)]
pub struct OnceEntry {
  pub value: Value,
  pub expires_at: Option<SystemTime>,
}

impl OnceEntry {
  pub fn is_fresh(&self, now: SystemTime) -> bool {
    self.expires_at.is_none_or(|at| at > now)
  }
}

/// Backing storage for cached once values. Expired entries are left in
/// place and overwritten on the next computation.
pub trait OnceStore: Send + Sync {
  fn read(&self, key: &str) -> Option<OnceEntry>;
  fn write(&self, key: &str, entry: OnceEntry);
  fn delete(&self, key: &str);
  fn clear(&self);
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryOnceStore {
  entries: DashMap<String, OnceEntry>,
}

impl MemoryOnceStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl OnceStore for MemoryOnceStore {
  fn read(&self, key: &str) -> Option<OnceEntry> {
    self.entries.get(key).map(|e| e.value().clone())
  }

  fn write(&self, key: &str, entry: OnceEntry) {
    self.entries.insert(key.to_string(), entry);
  }

  fn delete(&self, key: &str) {
    self.entries.remove(key);
  }

  fn clear(&self) {
    self.entries.clear();
  }
}

/// Single-flight cache in front of a [`OnceStore`].
///
/// Concurrent misses on one key queue behind a per-key lock; the first
/// computes and the rest read its result.
pub struct OnceCache {
  store: Arc<dyn OnceStore>,
  flights: DashMap<String, Arc<Mutex<()>>>,
}

impl OnceCache {
  pub fn new(store: Arc<dyn OnceStore>) -> Self {
    Self { store, flights: DashMap::new() }
  }

  pub fn memory() -> Self {
    Self::new(Arc::new(MemoryOnceStore::new()))
  }

  fn fresh(&self, key: &str) -> Option<Value> {
    self.store.read(key).filter(|e| e.is_fresh(SystemTime::now())).map(|e| e.value)
  }

  pub async fn get_or_compute<F, Fut>(
    &self,
    key: &str,
    expires_in: Option<Duration>,
    compute: F,
  ) -> Result<Value, InertiaError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, InertiaError>>,
  {
    if let Some(value) = self.fresh(key) {
      return Ok(value);
    }
    let flight = self.flights.entry(key.to_string()).or_default().clone();
    let _guard = flight.lock().await;
    if let Some(value) = self.fresh(key) {
      return Ok(value);
    }

    tracing::debug!(key, "computing once prop");
    let value = compute().await?;
    let expires_at = expires_in.map(|ttl| SystemTime::now() + ttl);
    self.store.write(key, OnceEntry { value: value.clone(), expires_at });
    Ok(value)
  }

  /// Drop one cached value; the next read recomputes it.
  pub fn invalidate(&self, key: &str) {
    self.store.delete(key);
  }

  pub fn clear(&self) {
    self.store.clear();
  }
}

impl Default for OnceCache {
  fn default() -> Self {
    Self::memory()
  }
}

impl std::fmt::Debug for OnceCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OnceCache").field("flights", &self.flights.len()).finish()
  }
}
