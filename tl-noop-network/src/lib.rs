// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use tl_log_primitives::LogEntry;
use tl_network::{Delivery, LogTransport};

/// A transport that declines every batch. Configuring this instead of `HttpTransport` disables
/// remote delivery without code changes; drained batches fall through to the durable store.
pub struct NoopTransport;

#[async_trait::async_trait]
impl LogTransport for NoopTransport {
  async fn send_batch(&self, _logs: &[LogEntry]) -> anyhow::Result<Delivery> {
    Ok(Delivery::Skipped)
  }
}
