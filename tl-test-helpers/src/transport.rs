// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tl_log_primitives::LogEntry;
use tl_network::{Delivery, LogTransport};

//
// TestTransport
//

/// A [`LogTransport`] that records delivered batches and can be flipped into a failing state to
/// drive the requeue path.
#[derive(Clone, Default)]
pub struct TestTransport {
  batches: Arc<Mutex<Vec<Vec<LogEntry>>>>,
  failing: Arc<AtomicBool>,
}

impl TestTransport {
  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  /// Batches accepted so far, in delivery order.
  #[must_use]
  pub fn batches(&self) -> Vec<Vec<LogEntry>> {
    self.batches.lock().clone()
  }
}

#[async_trait::async_trait]
impl LogTransport for TestTransport {
  async fn send_batch(&self, logs: &[LogEntry]) -> anyhow::Result<Delivery> {
    if self.failing.load(Ordering::SeqCst) {
      anyhow::bail!("simulated transport failure");
    }

    self.batches.lock().push(logs.to_vec());
    Ok(Delivery::Delivered)
  }
}
