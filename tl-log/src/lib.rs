// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

pub mod rate_limit_log;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

const DEFAULT_FILTER_RULES: &str = "info";

/// Initializes the internal diagnostics subscriber. The telemetry engine itself logs through the
/// `log` macros; this routes them to stderr with a `RUST_LOG`-style filter. Calling this more
/// than once is a no-op, which keeps per-binary test init simple.
pub fn initialize() {
  let stderr = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_ansi(std::env::var("TL_LOG_ANSI").is_ok())
    .with_line_number(true)
    .compact();

  let filter = EnvFilter::new(
    std::env::var("RUST_LOG")
      .as_deref()
      .unwrap_or(DEFAULT_FILTER_RULES),
  );

  if Registry::default()
    .with(filter)
    .with(stderr)
    .try_init()
    .is_ok()
  {
    log::set_max_level(tracing_log::AsLog::as_log(
      &tracing_subscriber::filter::LevelFilter::current(),
    ));
  }
}
