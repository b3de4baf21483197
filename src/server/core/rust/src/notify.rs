/* src/server/core/rust/src/notify.rs */

use std::sync::Arc;

/// Receives advisory conditions. Never used for errors.
pub trait Notifier: Send + Sync {
  /// Plain-valued props a partial reload excluded. They were computed
  /// anyway; converting them to thunks avoids that.
  fn unoptimized_partial_render(&self, component: &str, paths: &[String]);

  /// A deprecated API or payload shape was used.
  fn deprecated(&self, message: &str);
}

/// Logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn unoptimized_partial_render(&self, component: &str, paths: &[String]) {
    tracing::warn!(
      component,
      props = %paths.join(", "),
      "partial reload excluded plain-valued props that were computed anyway; wrap them in a thunk"
    );
  }

  fn deprecated(&self, message: &str) {
    tracing::warn!("deprecated: {message}");
  }
}

/// What the engine notifies: every advisory is logged, then handed to the
/// host's notifier when one is registered.
pub(crate) struct Advisories {
  hook: Option<Arc<dyn Notifier>>,
}

impl Advisories {
  pub(crate) fn new(hook: Option<Arc<dyn Notifier>>) -> Self {
    Self { hook }
  }
}

impl Notifier for Advisories {
  fn unoptimized_partial_render(&self, component: &str, paths: &[String]) {
    LogNotifier.unoptimized_partial_render(component, paths);
    if let Some(ref hook) = self.hook {
      hook.unoptimized_partial_render(component, paths);
    }
  }

  fn deprecated(&self, message: &str) {
    LogNotifier.deprecated(message);
    if let Some(ref hook) = self.hook {
      hook.deprecated(message);
    }
  }
}
