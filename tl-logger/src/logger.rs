// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./logger_test.rs"]
mod logger_test;

use crate::buffer::{DEFAULT_SOFT_CAP, LogBuffer};
use crate::context::{PageContextProvider, StackProvider};
use std::sync::Arc;
use time::OffsetDateTime;
use tl_local_store::LocalLogStore;
use tl_log_primitives::{
  fields,
  LogEntry,
  LogFields,
  LogLevel,
  SOURCE_FRONTEND,
  STACK_FIELD,
  Value,
};
use tl_network::{Delivery, LogTransport};
use tl_session::Strategy;
use tl_time::TimeProvider;
use tokio::sync::mpsc;

//
// Config
//

#[derive(Debug, Clone, Copy)]
pub struct Config {
  /// Buffer length at which a size-triggered flush fires.
  pub buffer_soft_cap: usize,
  /// Hard cap on the durable store's retained entries.
  pub local_store_capacity: usize,
  /// Optional periodic drain. Disabled by default; 30s is the conventional interval when
  /// enabled.
  pub flush_interval: Option<time::Duration>,
  /// Mirror entries to the developer console channel. Defaults to on for debug builds only.
  pub console_passthrough: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      buffer_soft_cap: DEFAULT_SOFT_CAP,
      local_store_capacity: tl_local_store::DEFAULT_CAPACITY,
      flush_interval: None,
      console_passthrough: cfg!(debug_assertions),
    }
  }
}

//
// Inner
//

pub(crate) struct Inner {
  pub(crate) session: Strategy,
  pub(crate) buffer: LogBuffer,
  pub(crate) local_store: LocalLogStore,
  pub(crate) transport: Option<Arc<dyn LogTransport>>,
  pub(crate) time_provider: Arc<dyn TimeProvider>,
  pub(crate) page_context: Arc<dyn PageContextProvider>,
  pub(crate) stack_provider: Arc<dyn StackProvider>,
  pub(crate) console_passthrough: bool,
  pub(crate) flush_tx: mpsc::Sender<()>,
}

impl Inner {
  fn make_entry(&self, level: LogLevel, message: String, mut extra: LogFields) -> LogEntry {
    if level == LogLevel::Error && !extra.contains_key(STACK_FIELD) {
      extra.insert(
        STACK_FIELD.into(),
        Value::String(self.stack_provider.capture()),
      );
    }

    LogEntry {
      timestamp: self.time_provider.now(),
      level,
      message,
      session_id: self.session.session_id(),
      user_id: self.session.user_id(),
      url: self.page_context.url(),
      user_agent: self.page_context.user_agent(),
      source: SOURCE_FRONTEND.to_string(),
      extra,
    }
  }
}

//
// LoggerHandle
//

/// The public logging facade handed to application code. Cheap to clone; all clones share one
/// buffer, durable store and session. No operation on this type can fail or panic back into the
/// caller: this subsystem is the last line of defense for failures elsewhere.
#[derive(Clone)]
pub struct LoggerHandle {
  pub(crate) inner: Arc<Inner>,
}

impl LoggerHandle {
  pub fn debug(&self, message: impl Into<String>, extra: LogFields) {
    self.log(LogLevel::Debug, message, extra);
  }

  pub fn info(&self, message: impl Into<String>, extra: LogFields) {
    self.log(LogLevel::Info, message, extra);
  }

  pub fn warn(&self, message: impl Into<String>, extra: LogFields) {
    self.log(LogLevel::Warn, message, extra);
  }

  pub fn error(&self, message: impl Into<String>, extra: LogFields) {
    self.log(LogLevel::Error, message, extra);
  }

  /// The single funnel every emission goes through: stamps the entry, optionally mirrors it to
  /// the developer console, appends it to the buffer and evaluates the flush triggers. Errors
  /// are additionally written straight to the durable store so they survive a failed flush.
  pub fn log(&self, level: LogLevel, message: impl Into<String>, extra: LogFields) {
    let entry = self.inner.make_entry(level, message.into(), extra);

    if self.inner.console_passthrough {
      log::log!(
        target: "telemetry",
        console_level(level),
        "{} {}",
        entry.message,
        Value::Object(
          entry
            .extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
        )
      );
    }

    if level == LogLevel::Error {
      self.inner.local_store.persist(&entry);
    }

    let at_soft_cap = self.inner.buffer.push(entry);
    if level == LogLevel::Error || at_soft_cap {
      self.trigger_flush();
    }
  }

  /// Emits an `INFO` entry describing a discrete user interaction.
  pub fn user_action(&self, action: &str, details: LogFields) {
    let mut extra = fields! {
      "action_type" => "user_action",
      "action" => action,
    };
    extra.extend(details);

    self.log(LogLevel::Info, format!("User action: {action}"), extra);
  }

  /// Emits an `INFO` entry for a route transition.
  pub fn navigation(&self, from: &str, to: &str) {
    self.log(
      LogLevel::Info,
      format!("Navigation: {from} -> {to}"),
      fields! {
        "event_type" => "navigation",
        "from" => from,
        "to" => to,
      },
    );
  }

  /// Emits an entry for a completed API call, deriving severity from the HTTP status: >= 400 is
  /// an error, 3xx a warning, anything else informational.
  pub fn api_call(
    &self,
    method: &str,
    url: &str,
    status: u16,
    response_time: time::Duration,
    extra: LogFields,
  ) {
    let level = if status >= 400 {
      LogLevel::Error
    } else if (300 .. 400).contains(&status) {
      LogLevel::Warn
    } else {
      LogLevel::Info
    };

    let mut all = fields! {
      "event_type" => "api_call",
      "method" => method,
      "url" => url,
      "status" => status,
      "response_time_ms" => i64::try_from(response_time.whole_milliseconds()).unwrap_or_default(),
    };
    all.extend(extra);

    self.log(level, format!("API {method} {url} -> {status}"), all);
  }

  /// Emits an `ERROR` entry for a failure caught at a component boundary.
  pub fn component_error(
    &self,
    component_name: &str,
    error: impl std::fmt::Display,
    error_info: LogFields,
  ) {
    let mut extra = fields! {
      "event_type" => "component_error",
      "component" => component_name,
      "error" => error.to_string(),
    };
    extra.extend(error_info);

    self.log(
      LogLevel::Error,
      format!("Component error in {component_name}"),
      extra,
    );
  }

  /// Starts a performance timer; dropping the returned handle without calling
  /// [`OperationTimer::finish`] discards the measurement.
  #[must_use]
  pub fn start_timer(&self, operation: impl Into<String>) -> OperationTimer {
    OperationTimer {
      logger: self.clone(),
      operation: operation.into(),
      started_at: self.inner.time_provider.now(),
    }
  }

  /// Drains the buffer to the configured sinks. With no transport configured (or a transport
  /// that declines the batch) the batch lands in the durable store. On transport failure the
  /// batch is prepended back onto the live buffer and a single synthetic error entry is
  /// persisted describing the failure.
  pub async fn flush(&self) {
    let batch = self.inner.buffer.swap();
    if batch.is_empty() {
      return;
    }

    let Some(transport) = &self.inner.transport else {
      self.inner.local_store.extend(&batch);
      return;
    };

    match transport.send_batch(&batch).await {
      Ok(Delivery::Delivered) => {},
      Ok(Delivery::Skipped) => self.inner.local_store.extend(&batch),
      Err(e) => {
        let failure = self.inner.make_entry(
          LogLevel::Error,
          format!("log upload failed: {e:#}"),
          fields! {
            "event_type" => "log_upload_failure",
            "batch_size" => batch.len(),
          },
        );

        self.inner.buffer.requeue_front(batch);
        // Straight to the durable store, never the buffer: buffering the failure record would
        // feed it into the next upload attempt.
        self.inner.local_store.persist(&failure);
      },
    }
  }

  /// The shutdown-triggered drain: synchronous and durable-store only, since a page about to be
  /// discarded cannot wait on a network round trip.
  pub fn flush_to_store(&self) {
    let batch = self.inner.buffer.swap();
    if !batch.is_empty() {
      self.inner.local_store.extend(&batch);
    }
  }

  /// The durable store's current contents, for diagnostic surfaces.
  #[must_use]
  pub fn local_logs(&self) -> Vec<LogEntry> {
    self.inner.local_store.read_all()
  }

  pub fn clear_local_logs(&self) {
    self.inner.local_store.clear();
  }

  fn trigger_flush(&self) {
    if self.inner.transport.is_some() {
      // The flusher owns transport drains. A full channel means one is already pending.
      let _ = self.inner.flush_tx.try_send(());
    } else {
      self.flush_to_store();
    }
  }
}

const fn console_level(level: LogLevel) -> log::Level {
  match level {
    LogLevel::Debug => log::Level::Debug,
    LogLevel::Info => log::Level::Info,
    LogLevel::Warn => log::Level::Warn,
    LogLevel::Error => log::Level::Error,
  }
}

//
// OperationTimer
//

/// A running performance measurement. `finish` emits an `INFO` entry with the elapsed duration
/// rounded to the nearest whole millisecond.
pub struct OperationTimer {
  logger: LoggerHandle,
  operation: String,
  started_at: OffsetDateTime,
}

impl OperationTimer {
  #[allow(clippy::cast_possible_truncation)]
  pub fn finish(self) {
    let elapsed = self.logger.inner.time_provider.now() - self.started_at;
    let duration_ms = (elapsed.as_seconds_f64() * 1_000.0).round() as i64;

    let extra = fields! {
      "event_type" => "performance",
      "operation" => self.operation.as_str(),
      "duration_ms" => duration_ms,
    };
    self.logger.log(
      LogLevel::Info,
      format!("Performance: {}", self.operation),
      extra,
    );
  }
}
