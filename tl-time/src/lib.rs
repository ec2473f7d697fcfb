// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt


use parking_lot::Mutex;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::time::{Interval, Timeout, interval, interval_at};

//
// OffsetDateTimeExt
//

pub trait OffsetDateTimeExt {
  fn unix_timestamp_ms(&self) -> i64;
}

impl OffsetDateTimeExt for OffsetDateTime {
  #[must_use]
  fn unix_timestamp_ms(&self) -> i64 {
    self.unix_timestamp() * 1_000 + i64::from(self.nanosecond() / 1_000_000)
  }
}

//
// TimeDurationExt
//

pub trait TimeDurationExt {
  fn advance(self) -> impl Future<Output = ()>;
  fn sleep(self) -> impl Future<Output = ()>;
  fn interval(self) -> Interval;
  fn interval_at(self) -> Interval;
  fn timeout<F: IntoFuture>(self, f: F) -> Timeout<F::IntoFuture>;
  fn add_tokio_now(self) -> tokio::time::Instant;
}

impl TimeDurationExt for time::Duration {
  fn advance(self) -> impl Future<Output = ()> {
    tokio::time::advance(self.unsigned_abs())
  }

  fn sleep(self) -> impl Future<Output = ()> {
    tokio::time::sleep(self.unsigned_abs())
  }

  fn interval(self) -> Interval {
    interval(self.unsigned_abs())
  }

  fn interval_at(self) -> Interval {
    interval_at(self.add_tokio_now(), self.unsigned_abs())
  }

  fn timeout<F: IntoFuture>(self, f: F) -> Timeout<F::IntoFuture> {
    tokio::time::timeout(self.unsigned_abs(), f)
  }

  fn add_tokio_now(self) -> tokio::time::Instant {
    tokio::time::Instant::now() + self.unsigned_abs()
  }
}

//
// TimeProvider
//

/// The wall clock seam. Every timestamp stamped onto a telemetry entry comes through this trait
/// so tests can pin or advance time.
#[async_trait::async_trait]
pub trait TimeProvider: Send + Sync {
  fn now(&self) -> OffsetDateTime;
  async fn sleep(&self, duration: time::Duration);
}

//
// SystemTimeProvider
//

pub struct SystemTimeProvider;

#[async_trait::async_trait]
impl TimeProvider for SystemTimeProvider {
  fn now(&self) -> OffsetDateTime {
    OffsetDateTime::now_utc()
  }

  async fn sleep(&self, duration: time::Duration) {
    tokio::time::sleep(duration.unsigned_abs()).await;
  }
}

//
// TestTimeProvider
//

#[derive(Clone)]
pub struct TestTimeProvider {
  now: Arc<Mutex<OffsetDateTime>>,
}

impl TestTimeProvider {
  #[must_use]
  pub fn new(now: OffsetDateTime) -> Self {
    Self {
      now: Arc::new(Mutex::new(now)),
    }
  }

  pub fn advance(&self, duration: time::Duration) {
    *self.now.lock() += duration;
  }

  pub fn set_time(&self, new_time: OffsetDateTime) {
    *self.now.lock() = new_time;
  }
}

#[async_trait::async_trait]
impl TimeProvider for TestTimeProvider {
  fn now(&self) -> OffsetDateTime {
    *self.now.lock()
  }

  async fn sleep(&self, duration: time::Duration) {
    // For testing purposes we don't actually want to sleep, just advance the time. Yield so the
    // caller still relinquishes the executor the way a real sleep would.
    *self.now.lock() += duration;
    tokio::task::yield_now().await;
  }
}
