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
use tl_key_value::{Key, Store};
use tl_log_primitives::{LogEntry, SOURCE_FRONTEND};

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  tl_test_helpers::test_global_init();
}

/// The slot where the host application keeps the bearer credential. Shared with the identity
/// slots; no separate credential plumbing.
pub static AUTH_TOKEN_KEY: Key<String> = Key::new("identity.token.1");

/// The fixed collector path, relative to the configured base URL.
pub const UPLOAD_PATH: &str = "/api/logs";

//
// Delivery
//

/// The outcome of a batch handoff. `Skipped` means the transport declined the batch without
/// failing (disabled delivery, missing credential); the caller routes such batches to the
/// durable store instead of requeueing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  Delivered,
  Skipped,
}

//
// LogTransport
//

/// Outbound delivery target for drained batches. Implementations must not retry internally; a
/// failed attempt is complete, and the flush policy owns requeueing.
#[async_trait::async_trait]
pub trait LogTransport: Send + Sync {
  async fn send_batch(&self, logs: &[LogEntry]) -> anyhow::Result<Delivery>;
}

//
// UploadRequest
//

#[derive(serde::Serialize)]
pub struct UploadRequest<'a> {
  pub logs: &'a [LogEntry],
  pub source: &'static str,
}

impl<'a> UploadRequest<'a> {
  #[must_use]
  pub fn new(logs: &'a [LogEntry]) -> Self {
    Self {
      logs,
      source: SOURCE_FRONTEND,
    }
  }
}

//
// HttpTransport
//

/// Batched delivery to the remote collector over HTTP. The bearer credential is read fresh from
/// the store on every attempt so that sign-in and sign-out take effect without reconfiguration;
/// an absent credential skips delivery for that flush.
pub struct HttpTransport {
  client: reqwest::Client,
  base_url: String,
  store: Arc<Store>,
}

impl HttpTransport {
  #[must_use]
  pub fn new(base_url: impl Into<String>, store: Arc<Store>) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: base_url.into(),
      store,
    }
  }
}

#[async_trait::async_trait]
impl LogTransport for HttpTransport {
  async fn send_batch(&self, logs: &[LogEntry]) -> anyhow::Result<Delivery> {
    let Some(token) = self.store.get_string(&AUTH_TOKEN_KEY) else {
      log::debug!("no auth token present, skipping log upload of {} entries", logs.len());
      return Ok(Delivery::Skipped);
    };

    self
      .client
      .post(format!("{}{UPLOAD_PATH}", self.base_url))
      .bearer_auth(token)
      .json(&UploadRequest::new(logs))
      .send()
      .await?
      .error_for_status()?;

    Ok(Delivery::Delivered)
  }
}
