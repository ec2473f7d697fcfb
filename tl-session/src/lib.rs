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
use tl_time::{OffsetDateTimeExt, TimeProvider};
use uuid::Uuid;

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  tl_test_helpers::test_global_init();
}

/// The slot where the host application persists the signed-in user's profile.
pub static USER_PROFILE_KEY: Key<UserProfile> = Key::new("identity.user.1");

/// The user id attached to entries when no usable profile is persisted.
pub const ANONYMOUS_USER_ID: &str = "anonymous";

//
// UserProfile
//

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

impl Storable for UserProfile {}

//
// Strategy
//

/// Derives the identity attached to every entry: a session id unique per process start and a
/// best-effort user id. Both are resolved once and cached for the process lifetime; sessions are
/// never persisted, so each page load begins a new one.
pub struct Strategy {
  store: Arc<Store>,
  time_provider: Arc<dyn TimeProvider>,
  state: parking_lot::Mutex<Option<InMemoryState>>,
}

impl Strategy {
  pub fn new(store: Arc<Store>, time_provider: Arc<dyn TimeProvider>) -> Self {
    Self {
      store,
      time_provider,
      state: parking_lot::Mutex::new(None),
    }
  }

  pub fn session_id(&self) -> String {
    self.state(|state| state.session_id.clone())
  }

  pub fn user_id(&self) -> String {
    self.state(|state| state.user_id.clone())
  }

  fn state<R>(&self, f: impl FnOnce(&InMemoryState) -> R) -> R {
    let mut guard = self.state.lock();
    if let Some(state) = guard.as_ref() {
      return f(state);
    }

    let state = InMemoryState {
      session_id: self.generate_session_id(),
      user_id: self.resolve_user_id(),
    };
    log::info!("telemetry session started: {:?}", state.session_id);

    f(guard.insert(state))
  }

  /// Combines the start timestamp with a random component so two sessions starting in the same
  /// millisecond still differ.
  fn generate_session_id(&self) -> String {
    let started_at_ms = self.time_provider.now().unix_timestamp_ms();
    format!("{started_at_ms}-{}", Uuid::new_v4())
  }

  /// Read-only and best-effort: absence or corrupt profile data falls back to the anonymous
  /// sentinel, never an error.
  fn resolve_user_id(&self) -> String {
    self
      .store
      .get(&USER_PROFILE_KEY)
      .map_or_else(|| ANONYMOUS_USER_ID.to_string(), |profile| profile.id)
  }
}

//
// InMemoryState
//

#[derive(Clone, Debug)]
struct InMemoryState {
  session_id: String,
  user_id: String,
}
