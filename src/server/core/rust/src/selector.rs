/* src/server/core/rust/src/selector.rs */

use inertia_engine::path_prefixes;

use crate::headers::InertiaHeaders;
use crate::prop::Capabilities;

/// Decides, per prop path, whether it belongs in this response.
///
/// A request is a matching partial reload only when it is a protocol request
/// whose `X-Inertia-Partial-Component` names the component being rendered.
/// Everything else is a full reload.
#[derive(Debug, Clone, Copy)]
pub struct Selector<'a> {
  partial: bool,
  headers: &'a InertiaHeaders,
}

impl<'a> Selector<'a> {
  pub fn new(component: &str, headers: &'a InertiaHeaders) -> Self {
    let partial = headers.inertia && headers.partial_component.as_deref() == Some(component);
    Self { partial, headers }
  }

  pub fn is_partial(&self) -> bool {
    self.partial
  }

  /// `path` is the dot path of the prop from the props root.
  pub fn keep(&self, caps: &Capabilities, path: &str) -> bool {
    if caps.always {
      return true;
    }
    if !self.partial {
      return !caps.ignore_on_first_load;
    }
    let only = &self.headers.partial_data;
    if !only.is_empty() && !named(only, path) {
      return false;
    }
    !self.is_excepted(path)
  }

  /// Named, directly or through an ancestor, in `X-Inertia-Partial-Except`.
  pub fn is_excepted(&self, path: &str) -> bool {
    self.partial && named(&self.headers.partial_except, path)
  }

  /// Named in `X-Inertia-Reset`.
  pub fn is_reset(&self, key: &str) -> bool {
    self.headers.reset.iter().any(|k| k == key)
  }
}

fn named(list: &[String], path: &str) -> bool {
  path_prefixes(path).any(|prefix| list.iter().any(|k| k == prefix))
}
