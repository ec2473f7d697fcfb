// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::{Config, LoggerHandle};
use crate::builder::{InitParams, Logger, LoggerBuilder};
use crate::context::{StackProvider, StaticPageContext};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use time::ext::{NumericalDuration, NumericalStdDuration};
use time::macros::datetime;
use tl_key_value::Store;
use tl_local_store::LocalLogStore;
use tl_log_primitives::{LogEntry, LogLevel, Value, fields};
use tl_network::LogTransport;
use tl_noop_network::NoopTransport;
use tl_test_helpers::storage::MemoryStorage;
use tl_test_helpers::transport::TestTransport;
use tl_time::TestTimeProvider;

const FIXED_STACK: &str = "at handler (app.tsx:42)";

struct FixedStackProvider;

impl StackProvider for FixedStackProvider {
  fn capture(&self) -> String {
    FIXED_STACK.to_string()
  }
}

//
// Setup
//

struct Setup {
  storage: MemoryStorage,
  time_provider: TestTimeProvider,
  logger: Logger,
}

impl Setup {
  fn new(config: Config, transport: Option<Arc<dyn LogTransport>>) -> Self {
    Self::with_storage(MemoryStorage::default(), config, transport)
  }

  fn with_storage(
    storage: MemoryStorage,
    config: Config,
    transport: Option<Arc<dyn LogTransport>>,
  ) -> Self {
    let time_provider = TestTimeProvider::new(datetime!(2024-03-01 12:00:00 UTC));
    let logger = LoggerBuilder::new(InitParams {
      store: Arc::new(Store::new(Box::new(storage.clone()))),
      time_provider: Arc::new(time_provider.clone()),
      page_context: Arc::new(StaticPageContext::new("/listings", "test-agent")),
      transport,
      event_source: None,
      config,
    })
    .with_stack_provider(Arc::new(FixedStackProvider))
    .build();

    Self {
      storage,
      time_provider,
      logger,
    }
  }

  fn handle(&self) -> LoggerHandle {
    self.logger.new_handle()
  }
}

fn messages(entries: &[LogEntry]) -> Vec<String> {
  entries.iter().map(|e| e.message.clone()).collect()
}

fn field<'a>(entry: &'a LogEntry, name: &str) -> &'a Value {
  entry
    .extra
    .get(name)
    .unwrap_or_else(|| panic!("missing field {name:?}"))
}

async fn wait_until(mut predicate: impl FnMut() -> bool) {
  for _ in 0 .. 1_000 {
    if predicate() {
      return;
    }
    tokio::task::yield_now().await;
  }

  panic!("condition never became true");
}

//
// Buffering and triggers
//

#[test]
fn buffers_entries_until_a_flush_trigger() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.info("a", fields! {});
  handle.debug("b", fields! {});
  handle.warn("c", fields! {});

  assert_eq!(3, handle.inner.buffer.len());
  assert!(handle.local_logs().is_empty());
}

#[test]
fn soft_cap_triggers_a_drain() {
  let setup = Setup::new(
    Config {
      buffer_soft_cap: 3,
      ..Config::default()
    },
    None,
  );
  let handle = setup.handle();

  handle.info("a", fields! {});
  handle.info("b", fields! {});
  assert!(handle.local_logs().is_empty());

  handle.info("c", fields! {});
  assert!(handle.inner.buffer.is_empty());
  assert_eq!(vec!["a", "b", "c"], messages(&handle.local_logs()));
}

#[test]
fn errors_persist_directly_and_flush() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.info("a", fields! {});
  handle.info("b", fields! {});
  handle.error("c", fields! {});

  // The error is written straight to the store before the drain, so it appears twice: once on
  // its own and once inside the drained batch.
  let stored = handle.local_logs();
  assert_eq!(vec!["c", "a", "b", "c"], messages(&stored));
  assert_eq!(LogLevel::Error, stored[0].level);
  assert!(handle.inner.buffer.is_empty());
}

#[test]
fn error_entries_get_a_stack() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.error("implicit", fields! {});
  handle.error("explicit", fields! { "stack" => "at explode (cart.tsx:7)" });
  handle.info("no stack", fields! {});

  let stored = handle.local_logs();
  let implicit = stored.iter().find(|e| e.message == "implicit").unwrap();
  let explicit = stored.iter().find(|e| e.message == "explicit").unwrap();
  let info = stored.iter().find(|e| e.message == "no stack");

  assert_eq!(FIXED_STACK, field(implicit, "stack"));
  // A caller-provided stack is never overwritten.
  assert_eq!("at explode (cart.tsx:7)", field(explicit, "stack"));
  assert!(info.is_none_or(|e| !e.has_stack()));
}

//
// Flush outcomes
//

#[tokio::test]
async fn flush_with_an_empty_buffer_is_a_noop() {
  let transport = TestTransport::default();
  let setup = Setup::new(Config::default(), Some(Arc::new(transport.clone())));
  let handle = setup.handle();

  handle.flush().await;

  assert!(transport.batches().is_empty());
  assert!(handle.local_logs().is_empty());
}

#[tokio::test]
async fn delivered_batches_leave_the_device() {
  let transport = TestTransport::default();
  let setup = Setup::new(Config::default(), Some(Arc::new(transport.clone())));
  let handle = setup.handle();

  handle.info("a", fields! {});
  handle.info("b", fields! {});
  handle.flush().await;

  assert_eq!(1, transport.batches().len());
  assert_eq!(vec!["a", "b"], messages(&transport.batches()[0]));
  assert!(handle.local_logs().is_empty());
  assert!(handle.inner.buffer.is_empty());
}

#[tokio::test]
async fn error_wakes_the_background_flusher() {
  let transport = TestTransport::default();
  let setup = Setup::new(Config::default(), Some(Arc::new(transport.clone())));
  let handle = setup.handle();

  handle.error("boom", fields! {});

  wait_until(|| !transport.batches().is_empty()).await;
  assert_eq!(vec!["boom"], messages(&transport.batches()[0]));
  // The direct durable copy of the error is unaffected by the delivery.
  assert_eq!(vec!["boom"], messages(&handle.local_logs()));
}

#[tokio::test]
async fn transport_failure_requeues_and_records() {
  let transport = TestTransport::default();
  let setup = Setup::new(Config::default(), Some(Arc::new(transport.clone())));
  let handle = setup.handle();

  transport.set_failing(true);
  handle.info("a", fields! {});
  handle.info("b", fields! {});
  handle.flush().await;

  // The batch went back to the front of the buffer, in order.
  assert_eq!(2, handle.inner.buffer.len());

  // One synthetic error entry describes the failure, durably and outside the buffer.
  let stored = handle.local_logs();
  assert_eq!(1, stored.len());
  assert_eq!(LogLevel::Error, stored[0].level);
  assert!(stored[0].message.starts_with("log upload failed"));
  assert_eq!("log_upload_failure", field(&stored[0], "event_type"));
  assert_eq!(2, field(&stored[0], "batch_size").as_u64().unwrap());
  assert!(stored[0].has_stack());

  // Recovery: entries logged meanwhile queue behind the requeued batch.
  transport.set_failing(false);
  handle.info("c", fields! {});
  handle.flush().await;

  assert_eq!(1, transport.batches().len());
  assert_eq!(vec!["a", "b", "c"], messages(&transport.batches()[0]));
}

#[tokio::test]
async fn declined_batches_fall_back_to_the_store() {
  let setup = Setup::new(Config::default(), Some(Arc::new(NoopTransport)));
  let handle = setup.handle();

  handle.info("a", fields! {});
  handle.flush().await;

  assert_eq!(vec!["a"], messages(&handle.local_logs()));
  assert!(handle.inner.buffer.is_empty());
}

//
// Structured events
//

#[test]
fn user_action_shape() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.user_action("add_to_cart", fields! { "listing_id" => 42 });

  let entries = handle.inner.buffer.swap();
  assert_eq!(LogLevel::Info, entries[0].level);
  assert_eq!("User action: add_to_cart", entries[0].message);
  assert_eq!("user_action", field(&entries[0], "action_type"));
  assert_eq!("add_to_cart", field(&entries[0], "action"));
  assert_eq!(42, field(&entries[0], "listing_id").as_i64().unwrap());
}

#[test]
fn navigation_shape() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.navigation("/listings", "/listings/42");

  let entries = handle.inner.buffer.swap();
  assert_eq!(LogLevel::Info, entries[0].level);
  assert_eq!("Navigation: /listings -> /listings/42", entries[0].message);
  assert_eq!("navigation", field(&entries[0], "event_type"));
  assert_eq!("/listings", field(&entries[0], "from"));
  assert_eq!("/listings/42", field(&entries[0], "to"));
}

#[test]
fn api_call_maps_status_to_severity() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.api_call("GET", "/api/listings", 200, 150.milliseconds(), fields! {});
  handle.api_call("GET", "/api/listings", 302, 10.milliseconds(), fields! {});

  let entries = handle.inner.buffer.swap();
  assert_eq!(LogLevel::Info, entries[0].level);
  assert_eq!("API GET /api/listings -> 200", entries[0].message);
  assert_eq!("api_call", field(&entries[0], "event_type"));
  assert_eq!("GET", field(&entries[0], "method"));
  assert_eq!(200, field(&entries[0], "status").as_i64().unwrap());
  assert_eq!(
    150,
    field(&entries[0], "response_time_ms").as_i64().unwrap()
  );
  assert_eq!(LogLevel::Warn, entries[1].level);

  // 4xx and up is an error, which also lands in the durable store.
  handle.api_call("POST", "/api/orders", 503, 30.seconds(), fields! {});
  let stored = handle.local_logs();
  assert_eq!(LogLevel::Error, stored[0].level);
  assert!(stored[0].has_stack());
}

#[test]
fn component_error_shape() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.component_error(
    "ListingCard",
    "render failed",
    fields! { "props" => "{\"id\":42}" },
  );

  let stored = handle.local_logs();
  assert_eq!(LogLevel::Error, stored[0].level);
  assert_eq!("Component error in ListingCard", stored[0].message);
  assert_eq!("component_error", field(&stored[0], "event_type"));
  assert_eq!("ListingCard", field(&stored[0], "component"));
  assert_eq!("render failed", field(&stored[0], "error"));
  assert_eq!("{\"id\":42}", field(&stored[0], "props"));
}

#[test]
fn timer_reports_rounded_elapsed_milliseconds() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  let timer = handle.start_timer("search");
  setup.time_provider.advance(1_500.milliseconds());
  timer.finish();

  let timer = handle.start_timer("blur");
  setup.time_provider.advance(750.microseconds());
  timer.finish();

  let entries = handle.inner.buffer.swap();
  assert_eq!(LogLevel::Info, entries[0].level);
  assert_eq!("Performance: search", entries[0].message);
  assert_eq!("performance", field(&entries[0], "event_type"));
  assert_eq!("search", field(&entries[0], "operation"));
  assert_eq!(1_500, field(&entries[0], "duration_ms").as_i64().unwrap());
  assert_eq!(1, field(&entries[1], "duration_ms").as_i64().unwrap());
}

//
// Entry stamping
//

#[test]
fn entries_are_stamped_with_identity_and_context() {
  let storage = MemoryStorage::default();
  storage.set_raw(
    tl_session::USER_PROFILE_KEY.key(),
    "{\"id\":\"user-7\",\"email\":\"u7@tendra.example\"}",
  );
  let setup = Setup::with_storage(storage, Config::default(), None);
  let handle = setup.handle();

  handle.info("hello", fields! {});

  let entries = handle.inner.buffer.swap();
  assert_eq!(datetime!(2024-03-01 12:00:00 UTC), entries[0].timestamp);
  assert_eq!("user-7", entries[0].user_id);
  assert!(entries[0].session_id.starts_with("1709294400000-"));
  assert_eq!("/listings", entries[0].url);
  assert_eq!("test-agent", entries[0].user_agent);
  assert_eq!("frontend", entries[0].source);
}

//
// Durable store surface
//

#[test]
fn corrupt_durable_slot_reads_empty_and_recovers() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  setup
    .storage
    .set_raw(LocalLogStore::storage_key(), "{definitely not json");
  assert!(handle.local_logs().is_empty());

  handle.info("a", fields! {});
  handle.flush_to_store();
  assert_eq!(vec!["a"], messages(&handle.local_logs()));
}

#[test]
fn clear_local_logs_empties_the_slot() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.info("a", fields! {});
  handle.flush_to_store();
  assert_eq!(1, handle.local_logs().len());

  handle.clear_local_logs();
  assert!(handle.local_logs().is_empty());
}

//
// Background flusher
//

#[tokio::test(start_paused = true)]
async fn periodic_flush_drains_on_the_interval() {
  let transport = TestTransport::default();
  let setup = Setup::new(
    Config {
      flush_interval: Some(30.seconds()),
      ..Config::default()
    },
    Some(Arc::new(transport.clone())),
  );
  let handle = setup.handle();

  handle.info("a", fields! {});
  assert!(transport.batches().is_empty());

  tokio::time::sleep(31.std_seconds()).await;
  wait_until(|| !transport.batches().is_empty()).await;
  assert_eq!(vec!["a"], messages(&transport.batches()[0]));
}

#[tokio::test]
async fn shutdown_drains_to_the_store_not_the_transport() {
  let transport = TestTransport::default();
  let setup = Setup::new(Config::default(), Some(Arc::new(transport.clone())));
  let handle = setup.handle();

  handle.info("a", fields! {});
  setup.logger.shutdown().await;

  assert!(transport.batches().is_empty());
  assert_eq!(vec!["a"], messages(&handle.local_logs()));
}

#[tokio::test]
async fn shutdown_without_a_flusher_drains_synchronously() {
  let setup = Setup::new(Config::default(), None);
  let handle = setup.handle();

  handle.info("a", fields! {});
  setup.logger.shutdown().await;

  assert_eq!(vec!["a"], messages(&handle.local_logs()));
}
