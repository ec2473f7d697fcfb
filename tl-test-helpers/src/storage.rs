// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tl_key_value::Storage;

//
// MemoryStorage
//

/// An in-memory [`Storage`] with shared state: clones observe the same map, so a test can hand
/// one handle to a `Store` and keep another to inspect or corrupt raw values.
#[derive(Clone, Default)]
pub struct MemoryStorage {
  state: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
  pub fn set_raw(&self, key: &str, value: &str) {
    self
      .state
      .lock()
      .insert(key.to_string(), value.to_string());
  }

  #[must_use]
  pub fn get_raw(&self, key: &str) -> Option<String> {
    self.state.lock().get(key).cloned()
  }
}

impl Storage for MemoryStorage {
  fn set_string(&self, key: &str, value: &str) -> anyhow::Result<()> {
    self
      .state
      .lock()
      .insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn get_string(&self, key: &str) -> anyhow::Result<Option<String>> {
    Ok(self.state.lock().get(key).cloned())
  }

  fn delete(&self, key: &str) -> anyhow::Result<()> {
    self.state.lock().remove(key);
    Ok(())
  }
}

//
// FailingStorage
//

/// A [`Storage`] whose writes always fail, for exercising the swallow-and-warn paths.
#[derive(Clone, Default)]
pub struct FailingStorage;

impl Storage for FailingStorage {
  fn set_string(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
    anyhow::bail!("quota exceeded")
  }

  fn get_string(&self, _key: &str) -> anyhow::Result<Option<String>> {
    anyhow::bail!("storage unavailable")
  }

  fn delete(&self, _key: &str) -> anyhow::Result<()> {
    anyhow::bail!("storage unavailable")
  }
}
