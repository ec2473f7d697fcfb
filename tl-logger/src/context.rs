// telemetry-core - Tendra's client telemetry libraries
// Copyright Tendra, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//
// PageContextProvider
//

/// Environmental context stamped onto every entry at construction time: the current location and
/// a user-agent-equivalent client description. Provided by the embedding shell.
pub trait PageContextProvider: Send + Sync {
  fn url(&self) -> String;
  fn user_agent(&self) -> String;
}

//
// StaticPageContext
//

/// A [`PageContextProvider`] backed by plain values. The URL is updatable so hosts without a
/// live location handle can keep it current on navigation.
pub struct StaticPageContext {
  url: parking_lot::Mutex<String>,
  user_agent: String,
}

impl StaticPageContext {
  #[must_use]
  pub fn new(url: impl Into<String>, user_agent: impl Into<String>) -> Self {
    Self {
      url: parking_lot::Mutex::new(url.into()),
      user_agent: user_agent.into(),
    }
  }

  pub fn set_url(&self, url: impl Into<String>) {
    *self.url.lock() = url.into();
  }
}

impl PageContextProvider for StaticPageContext {
  fn url(&self) -> String {
    self.url.lock().clone()
  }

  fn user_agent(&self) -> String {
    self.user_agent.clone()
  }
}

//
// StackProvider
//

/// Call-stack introspection, invoked only when constructing `Error`-level entries that did not
/// arrive with a stack of their own.
pub trait StackProvider: Send + Sync {
  fn capture(&self) -> String;
}

//
// BacktraceStackProvider
//

/// The default [`StackProvider`], backed by the native backtrace facility.
pub struct BacktraceStackProvider;

impl StackProvider for BacktraceStackProvider {
  fn capture(&self) -> String {
    std::backtrace::Backtrace::force_capture().to_string()
  }
}
