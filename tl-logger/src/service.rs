// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::logger::LoggerHandle;
use tl_shutdown::ComponentShutdown;
use tl_time::TimeDurationExt;
use tokio::sync::mpsc;
use tokio::time::Interval;

//
// Flusher
//

/// The background drain loop: services severity- and size-triggered flush requests, runs the
/// optional periodic drain, and performs the final durable-store drain on shutdown.
pub(crate) struct Flusher {
  pub(crate) handle: LoggerHandle,
  pub(crate) flush_rx: mpsc::Receiver<()>,
  pub(crate) interval: Option<time::Duration>,
  pub(crate) shutdown: ComponentShutdown,
}

impl Flusher {
  pub(crate) async fn run(self) {
    let Self {
      handle,
      mut flush_rx,
      interval,
      mut shutdown,
    } = self;
    let mut ticker = interval.map(TimeDurationExt::interval_at);

    loop {
      tokio::select! {
        maybe_trigger = flush_rx.recv() => match maybe_trigger {
          Some(()) => handle.flush().await,
          None => break,
        },
        () = tick(ticker.as_mut()) => handle.flush().await,
        () = shutdown.cancelled() => {
          // A discarded page cannot await the transport, so the final drain is synchronous and
          // durable-store only.
          handle.flush_to_store();
          break;
        },
      }
    }
  }
}

async fn tick(ticker: Option<&mut Interval>) {
  match ticker {
    Some(ticker) => {
      ticker.tick().await;
    },
    None => std::future::pending().await,
  }
}
