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


use tl_log::warn_every;
use time::ext::NumericalDuration;

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  tl_test_helpers::test_global_init();
}

//
// Storage
//

/// The durable, origin-scoped key-value contract. Implementations wrap whatever the embedding
/// platform provides (browser local storage, a file, an in-memory map in tests). Values are
/// opaque strings; realistic capacity is a few MB with no cross-key transactionality.
pub trait Storage: Send + Sync {
  fn set_string(&self, key: &str, value: &str) -> anyhow::Result<()>;
  fn get_string(&self, key: &str) -> anyhow::Result<Option<String>>;
  fn delete(&self, key: &str) -> anyhow::Result<()>;
}

//
// Storable
//

/// A value that can be persisted in a [`Store`] slot as JSON.
pub trait Storable: serde::Serialize + serde::de::DeserializeOwned {}

//
// Store
//

/// A total wrapper over [`Storage`]: quota exhaustion, serialization failure and corrupt stored
/// data are swallowed and reported via rate-limited warnings, never propagated. Corrupt data
/// reads as absent and is left in place so reads stay side-effect free.
pub struct Store {
  storage: Box<dyn Storage + Send + Sync>,
}

impl Store {
  #[must_use]
  pub fn new(storage: Box<dyn Storage + Send + Sync>) -> Self {
    Self { storage }
  }

  pub fn set_string(&self, key: &Key<String>, value: &str) {
    if let Err(e) = self.storage.set_string(key.key, value) {
      warn_every!(
        15.seconds(),
        "failed to set value for {:?} key: {:?}",
        key.key,
        e
      );
    }
  }

  #[must_use]
  pub fn get_string(&self, key: &Key<String>) -> Option<String> {
    self
      .storage
      .get_string(key.key)
      .map_err(|e| {
        warn_every!(
          15.seconds(),
          "failed to get value for {:?} key: {:?}",
          key.key,
          e
        );
      })
      .ok()
      .flatten()
  }

  pub fn set<T: Storable>(&self, key: &Key<T>, value: &T) {
    if let Err(e) = self.set_internal(key, value) {
      warn_every!(
        15.seconds(),
        "failed to set value for {:?} key: {:?}",
        key.key,
        e
      );
    }
  }

  #[must_use]
  pub fn get<T: Storable>(&self, key: &Key<T>) -> Option<T> {
    self
      .get_internal(key)
      .map_err(|e| {
        warn_every!(
          15.seconds(),
          "failed to get value for {:?} key: {:?}",
          key.key,
          e
        );
      })
      .ok()
      .flatten()
  }

  pub fn delete<T>(&self, key: &Key<T>) {
    if let Err(e) = self.storage.delete(key.key) {
      warn_every!(
        15.seconds(),
        "failed to delete value for {:?} key: {:?}",
        key.key,
        e
      );
    }
  }

  pub fn set_internal<T: Storable>(&self, key: &Key<T>, value: &T) -> anyhow::Result<()> {
    let json = match serde_json::to_string(value) {
      Ok(json) => json,
      Err(e) => anyhow::bail!("failed to serialize value: {e:?}"),
    };

    if let Err(e) = self.storage.set_string(key.key, &json) {
      anyhow::bail!("failed to set string: {e:?}");
    }

    Ok(())
  }

  pub fn get_internal<T: Storable>(&self, key: &Key<T>) -> anyhow::Result<Option<T>> {
    match self.storage.get_string(key.key) {
      Ok(json) => {
        let Some(json) = json else {
          return Ok(None);
        };

        match serde_json::from_str(&json) {
          Ok(value) => Ok(Some(value)),
          Err(e) => anyhow::bail!("failed to deserialize stored JSON: {e:?}"),
        }
      },
      Err(e) => anyhow::bail!("failed to get string: {e:?}"),
    }
  }
}

//
// Key
//

pub struct Key<T> {
  key: &'static str,
  _phantom: std::marker::PhantomData<T>,
}

impl<T> Key<T> {
  #[must_use]
  pub const fn new(key: &'static str) -> Self {
    Self {
      key,
      _phantom: std::marker::PhantomData,
    }
  }

  #[must_use]
  pub const fn key(&self) -> &str {
    self.key
  }
}
