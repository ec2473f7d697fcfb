// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#![deny(
  clippy::expect_used,
  clippy::panic,
  clippy::todo,
  clippy::unimplemented,
  clippy::unreachable,
  clippy::unwrap_used
)]


use std::sync::Arc;
use tl_key_value::{Key, Storable, Store};
use tl_log_primitives::LogEntry;

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  tl_test_helpers::test_global_init();
}

/// The slot holding the serialized array of retained entries.
static LOCAL_LOGS_KEY: Key<StoredLogs> = Key::new("telemetry.logs.1");

/// How many entries the durable slot retains by default.
pub const DEFAULT_CAPACITY: usize = 50;

//
// StoredLogs
//

#[derive(serde::Serialize, serde::Deserialize, Default)]
#[serde(transparent)]
struct StoredLogs(Vec<LogEntry>);

impl Storable for StoredLogs {}

//
// LocalLogStore
//

/// A capacity-bounded persistent log retained across page reloads. Entries are kept oldest-first
/// and evicted from the front once the cap is exceeded. Every operation is total: read or parse
/// failure is treated as an empty slot, write failure is swallowed by the underlying [`Store`].
///
/// Concurrent tabs sharing the storage origin can interleave writes; the truncation step is
/// last-writer-wins, which is accepted as eventual consistency across tabs.
pub struct LocalLogStore {
  store: Arc<Store>,
  capacity: usize,
}

impl LocalLogStore {
  #[must_use]
  pub fn new(store: Arc<Store>) -> Self {
    Self::with_capacity(store, DEFAULT_CAPACITY)
  }

  #[must_use]
  pub const fn with_capacity(store: Arc<Store>, capacity: usize) -> Self {
    Self { store, capacity }
  }

  /// Appends one entry, evicting the oldest past capacity.
  pub fn persist(&self, entry: &LogEntry) {
    self.extend(std::slice::from_ref(entry));
  }

  /// Appends a drained batch in order, evicting the oldest past capacity.
  pub fn extend(&self, batch: &[LogEntry]) {
    if batch.is_empty() {
      return;
    }

    let mut logs = self.read_all();
    logs.extend_from_slice(batch);
    if logs.len() > self.capacity {
      logs.drain(.. logs.len() - self.capacity);
    }

    self.store.set(&LOCAL_LOGS_KEY, &StoredLogs(logs));
  }

  /// Returns the retained entries, oldest-first. Empty on any read or parse failure.
  #[must_use]
  pub fn read_all(&self) -> Vec<LogEntry> {
    self
      .store
      .get(&LOCAL_LOGS_KEY)
      .map_or_else(Vec::new, |stored| stored.0)
  }

  /// Drops the retained entries entirely.
  pub fn clear(&self) {
    self.store.delete(&LOCAL_LOGS_KEY);
  }

  #[must_use]
  pub const fn capacity(&self) -> usize {
    self.capacity
  }

  /// The raw storage key, exposed so tests and diagnostics surfaces can inspect the slot.
  #[must_use]
  pub fn storage_key() -> &'static str {
    LOCAL_LOGS_KEY.key()
  }
}
