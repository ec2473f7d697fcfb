// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./monitor_test.rs"]
mod monitor_test;

use crate::logger::LoggerHandle;
use std::sync::Arc;
use tl_log_primitives::{fields, LogLevel, Value};

//
// VisibilityState
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
  Visible,
  Hidden,
}

impl VisibilityState {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Visible => "visible",
      Self::Hidden => "hidden",
    }
  }
}

//
// PlatformEvent
//

/// A global runtime signal delivered by the embedding platform's event source.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
  /// An uncaught synchronous error escaped to the global scope.
  UncaughtError {
    message: String,
    file: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
    stack: Option<String>,
  },
  /// An asynchronous rejection nobody handled.
  UnhandledRejection { reason: String },
  /// The page moved between foreground and background.
  VisibilityChange { state: VisibilityState },
  /// The page is about to be discarded.
  PageUnload,
}

//
// PlatformEventListener
//

pub trait PlatformEventListener: Send + Sync {
  fn on_event(&self, event: PlatformEvent);
}

//
// PlatformEventSource
//

/// The global event source contract. Implementations subscribe the listener exactly once at
/// initialization; there is no teardown since the process itself ends on page discard.
pub trait PlatformEventSource: Send + Sync {
  fn subscribe(&self, listener: Arc<dyn PlatformEventListener>);
}

//
// RuntimeMonitor
//

/// Translates each platform signal into exactly one facade call. Passive: it installs nothing
/// itself and only reacts to what the event source delivers.
pub struct RuntimeMonitor {
  handle: LoggerHandle,
}

impl RuntimeMonitor {
  #[must_use]
  pub fn new(handle: LoggerHandle) -> Self {
    Self { handle }
  }
}

impl PlatformEventListener for RuntimeMonitor {
  fn on_event(&self, event: PlatformEvent) {
    match event {
      PlatformEvent::UncaughtError {
        message,
        file,
        line,
        column,
        stack,
      } => {
        let mut extra = fields! { "event_type" => "global_error" };
        if let Some(file) = file {
          extra.insert("file".into(), Value::from(file));
        }
        if let Some(line) = line {
          extra.insert("line".into(), Value::from(line));
        }
        if let Some(column) = column {
          extra.insert("column".into(), Value::from(column));
        }
        if let Some(stack) = stack {
          // A platform-provided stack wins over capture at construction time.
          extra.insert("stack".into(), Value::from(stack));
        }

        self.handle.log(LogLevel::Error, message, extra);
      },
      PlatformEvent::UnhandledRejection { reason } => {
        self.handle.log(
          LogLevel::Error,
          "Unhandled rejection",
          fields! {
            "event_type" => "unhandled_rejection",
            "reason" => reason,
          },
        );
      },
      PlatformEvent::VisibilityChange { state } => {
        self.handle.log(
          LogLevel::Info,
          format!("Visibility changed: {}", state.as_str()),
          fields! {
            "event_type" => "visibility_change",
            "visibility" => state.as_str(),
          },
        );
      },
      // The unload signal emits no entry of its own; it only forces the shutdown drain.
      PlatformEvent::PageUnload => self.handle.flush_to_store(),
    }
  }
}
