// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./buffer_test.rs"]
mod buffer_test;

use parking_lot::Mutex;
use tl_log_primitives::LogEntry;

/// How many entries the in-memory buffer accumulates before a size-triggered flush.
pub const DEFAULT_SOFT_CAP: usize = 100;

//
// LogBuffer
//

/// The in-memory queue of entries awaiting a flush. The cap is soft: nothing is dropped when it
/// is reached, it only signals that a drain is due. Entries are only ever appended or swapped
/// out whole, never mutated.
#[derive(Debug)]
pub struct LogBuffer {
  soft_cap: usize,
  entries: Mutex<Vec<LogEntry>>,
}

impl LogBuffer {
  #[must_use]
  pub fn new(soft_cap: usize) -> Self {
    Self {
      soft_cap,
      entries: Mutex::new(Vec::new()),
    }
  }

  /// Appends an entry, returning true once the soft cap has been reached.
  pub fn push(&self, entry: LogEntry) -> bool {
    let mut entries = self.entries.lock();
    entries.push(entry);
    entries.len() >= self.soft_cap
  }

  /// Atomically takes the current contents; entries arriving afterwards start a fresh buffer.
  #[must_use]
  pub fn swap(&self) -> Vec<LogEntry> {
    std::mem::take(&mut *self.entries.lock())
  }

  /// Puts a failed batch back ahead of whatever was logged since it was swapped out, preserving
  /// the original emission order.
  pub fn requeue_front(&self, mut batch: Vec<LogEntry>) {
    let mut entries = self.entries.lock();
    batch.append(&mut entries);
    *entries = batch;
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.lock().is_empty()
  }
}
