// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

pub mod storage;
pub mod transport;

/// Shared per-test-binary initialization, installed via `ctor` in each crate's test build.
pub fn test_global_init() {
  tl_log::initialize();
}
