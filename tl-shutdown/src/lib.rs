// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use tokio::sync::watch;

//
// ComponentStatus
//

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComponentStatus {
  Running,
  PendingShutdown,
}

//
// ComponentShutdownTrigger
//

/// Initiates shutdown for a component. The trigger knows all components have wound down once
/// every associated `ComponentShutdown` has dropped.
#[derive(Debug)]
pub struct ComponentShutdownTrigger {
  status_tx: watch::Sender<ComponentStatus>,
}

impl Default for ComponentShutdownTrigger {
  fn default() -> Self {
    let (status_tx, _) = watch::channel(ComponentStatus::Running);
    Self { status_tx }
  }
}

impl ComponentShutdownTrigger {
  #[must_use]
  pub fn make_shutdown(&self) -> ComponentShutdown {
    ComponentShutdown {
      status_rx: self.status_tx.subscribe(),
    }
  }

  /// Signals shutdown and waits for all components to have dropped their shutdown handles.
  pub async fn shutdown(self) {
    self
      .status_tx
      .send_replace(ComponentStatus::PendingShutdown);
    self.status_tx.closed().await;
  }
}

//
// ComponentShutdown
//

/// Held by a component to observe the shutdown signal. The trigger's `shutdown` completes once
/// this drops.
#[derive(Clone, Debug)]
pub struct ComponentShutdown {
  status_rx: watch::Receiver<ComponentStatus>,
}

impl ComponentShutdown {
  /// Returns when the component has been cancelled.
  pub async fn cancelled(&mut self) {
    if *self.status_rx.borrow_and_update() == ComponentStatus::PendingShutdown {
      return;
    }
    let _ignored = self.status_rx.changed().await;
  }

  #[must_use]
  pub fn component_status(&self) -> ComponentStatus {
    *self.status_rx.borrow()
  }
}
