// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::buffer::LogBuffer;
use crate::context::{BacktraceStackProvider, PageContextProvider, StackProvider};
use crate::logger::{Config, Inner, LoggerHandle};
use crate::monitor::{PlatformEventSource, RuntimeMonitor};
use crate::service::Flusher;
use std::sync::Arc;
use tl_key_value::Store;
use tl_local_store::LocalLogStore;
use tl_network::LogTransport;
use tl_session::Strategy;
use tl_shutdown::ComponentShutdownTrigger;
use tl_time::TimeProvider;
use tokio::sync::mpsc;

//
// InitParams
//

/// Everything the engine consumes from its environment, injected at the composition root. There
/// is deliberately no global instance: constructing two loggers yields two independent sessions,
/// buffers and stores, which is what test isolation needs.
pub struct InitParams {
  pub store: Arc<Store>,
  pub time_provider: Arc<dyn TimeProvider>,
  pub page_context: Arc<dyn PageContextProvider>,
  pub transport: Option<Arc<dyn LogTransport>>,
  pub event_source: Option<Arc<dyn PlatformEventSource>>,
  pub config: Config,
}

//
// LoggerBuilder
//

pub struct LoggerBuilder {
  params: InitParams,
  stack_provider: Arc<dyn StackProvider>,
}

impl LoggerBuilder {
  #[must_use]
  pub fn new(params: InitParams) -> Self {
    Self {
      params,
      stack_provider: Arc::new(BacktraceStackProvider),
    }
  }

  #[must_use]
  pub fn with_stack_provider(mut self, stack_provider: Arc<dyn StackProvider>) -> Self {
    self.stack_provider = stack_provider;
    self
  }

  /// Wires the engine together and installs the runtime capture hooks. Must run inside a tokio
  /// runtime when a transport or a periodic flush interval is configured, since those spawn the
  /// background flusher.
  pub fn build(self) -> Logger {
    let config = self.params.config;
    let (flush_tx, flush_rx) = mpsc::channel(1);

    let inner = Arc::new(Inner {
      session: Strategy::new(
        self.params.store.clone(),
        self.params.time_provider.clone(),
      ),
      buffer: LogBuffer::new(config.buffer_soft_cap),
      local_store: LocalLogStore::with_capacity(
        self.params.store.clone(),
        config.local_store_capacity,
      ),
      transport: self.params.transport.clone(),
      time_provider: self.params.time_provider,
      page_context: self.params.page_context,
      stack_provider: self.stack_provider,
      console_passthrough: config.console_passthrough,
      flush_tx,
    });
    let handle = LoggerHandle { inner };

    // Hooks are installed exactly once and never removed; the process ends on page discard.
    if let Some(event_source) = &self.params.event_source {
      event_source.subscribe(Arc::new(RuntimeMonitor::new(handle.clone())));
    }

    let shutdown_trigger = ComponentShutdownTrigger::default();
    let flusher_task =
      if self.params.transport.is_some() || config.flush_interval.is_some() {
        Some(tokio::spawn(
          Flusher {
            handle: handle.clone(),
            flush_rx,
            interval: config.flush_interval,
            shutdown: shutdown_trigger.make_shutdown(),
          }
          .run(),
        ))
      } else {
        None
      };

    Logger {
      handle,
      shutdown_trigger,
      flusher_task,
    }
  }
}

//
// Logger
//

/// Owns the engine's background work. Application code logs through [`LoggerHandle`] clones;
/// this type stays at the composition root and is consumed by `shutdown`.
pub struct Logger {
  handle: LoggerHandle,
  shutdown_trigger: ComponentShutdownTrigger,
  flusher_task: Option<tokio::task::JoinHandle<()>>,
}

impl Logger {
  #[must_use]
  pub fn new_handle(&self) -> LoggerHandle {
    self.handle.clone()
  }

  /// Stops the flusher after its final durable-store drain. Without a flusher this drains the
  /// buffer directly.
  pub async fn shutdown(self) {
    if let Some(task) = self.flusher_task {
      self.shutdown_trigger.shutdown().await;
      let _ignored = task.await;
    } else {
      self.handle.flush_to_store();
    }
  }
}
