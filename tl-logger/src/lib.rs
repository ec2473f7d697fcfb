// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

mod buffer;
mod builder;
mod context;
mod logger;
mod monitor;
mod service;

pub use buffer::DEFAULT_SOFT_CAP;
pub use builder::{InitParams, Logger, LoggerBuilder};
pub use context::{
  BacktraceStackProvider,
  PageContextProvider,
  StackProvider,
  StaticPageContext,
};
pub use logger::{Config, LoggerHandle, OperationTimer};
pub use monitor::{
  PlatformEvent,
  PlatformEventListener,
  PlatformEventSource,
  RuntimeMonitor,
  VisibilityState,
};
pub use tl_log_primitives::{fields, LogEntry, LogFields, LogLevel};
pub use tl_network::{Delivery, LogTransport};

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  tl_test_helpers::test_global_init();
}
