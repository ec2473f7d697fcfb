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


use ahash::AHashMap;
use std::borrow::Cow;
use time::OffsetDateTime;

// Re-exported for the `fields!` macro expansion.
pub use serde_json::Value;

/// The `source` tag stamped on every entry, distinguishing client-originated events from
/// server-side log lines they may later be merged with for display.
pub const SOURCE_FRONTEND: &str = "frontend";

/// The reserved `extra` key holding a captured call stack for error-level entries.
pub const STACK_FIELD: &str = "stack";

//
// LogLevel
//

/// Entry severity, ordered. Serialized as the uppercase wire names.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  serde::Serialize,
  serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
  Debug,
  Info,
  Warn,
  Error,
}

impl LogLevel {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Debug => "DEBUG",
      Self::Info => "INFO",
      Self::Warn => "WARN",
      Self::Error => "ERROR",
    }
  }
}

impl std::fmt::Display for LogLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

//
// LogFields
//

pub type LogFieldKey = Cow<'static, str>;

/// The open `extra` mapping attached to an entry: string keys to arbitrary JSON values. Callers
/// may put anything serializable here; the engine never rejects a payload.
pub type LogFields = AHashMap<LogFieldKey, Value>;

/// Builds a [`LogFields`] map from `key => value` pairs. Values go through
/// `serde_json::Value::from`, so strings, numbers, booleans and `Value`s all work.
#[macro_export]
macro_rules! fields {
  () => { $crate::LogFields::default() };
  ($($key:expr => $value:expr),+ $(,)?) => {{
    let mut map = $crate::LogFields::default();
    $(map.insert($key.into(), $crate::Value::from($value));)+
    map
  }};
}

//
// LogEntry
//

/// One structured telemetry record. Immutable once constructed: the buffer and the durable store
/// only ever append or evict whole entries. Serialized in the camel-cased wire form shared with
/// the collector endpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
  /// Stamped at construction; monotonic with respect to emission order within a session, not
  /// across clock adjustments.
  #[serde(with = "time::serde::rfc3339")]
  pub timestamp: OffsetDateTime,
  pub level: LogLevel,
  pub message: String,
  pub session_id: String,
  pub user_id: String,
  pub url: String,
  pub user_agent: String,
  pub source: String,
  #[serde(default)]
  pub extra: LogFields,
}

impl LogEntry {
  /// Whether a non-empty stack trace was attached to this entry.
  #[must_use]
  pub fn has_stack(&self) -> bool {
    self
      .extra
      .get(STACK_FIELD)
      .and_then(Value::as_str)
      .is_some_and(|s| !s.is_empty())
  }
}
