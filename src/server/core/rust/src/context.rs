/* src/server/core/rust/src/context.rs */

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::headers::InertiaHeaders;

/// Key/value session storage supplied by the host framework.
///
/// Implementations use interior mutability: one store instance is shared by
/// everything handling a request.
pub trait SessionStore: Send + Sync {
  fn get(&self, key: &str) -> Option<Value>;
  fn set(&self, key: &str, value: Value);
  fn remove(&self, key: &str) -> Option<Value>;
}

/// In-memory session, one per client session.
#[derive(Debug, Default)]
pub struct MemorySession {
  data: Mutex<HashMap<String, Value>>,
}

impl MemorySession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.data.lock().is_empty()
  }
}

impl SessionStore for MemorySession {
  fn get(&self, key: &str) -> Option<Value> {
    self.data.lock().get(key).cloned()
  }

  fn set(&self, key: &str, value: Value) {
    self.data.lock().insert(key.to_string(), value);
  }

  fn remove(&self, key: &str) -> Option<Value> {
    self.data.lock().remove(key)
  }
}

#[derive(Clone)]
struct ContextInner {
  method: String,
  url: String,
  headers: InertiaHeaders,
  controller: Option<String>,
  action: Option<String>,
  session: Option<Arc<dyn SessionStore>>,
  data: Option<Arc<dyn Any + Send + Sync>>,
}

/// Per-request execution context handed to prop thunks, providers and
/// filter predicates. Cheap to clone.
#[derive(Clone)]
pub struct RequestContext {
  inner: Arc<ContextInner>,
}

impl RequestContext {
  pub fn new(method: impl Into<String>, url: impl Into<String>, headers: InertiaHeaders) -> Self {
    Self {
      inner: Arc::new(ContextInner {
        method: method.into().to_ascii_uppercase(),
        url: url.into(),
        headers,
        controller: None,
        action: None,
        session: None,
        data: None,
      }),
    }
  }

  /// Name the controller scope and action handling this request.
  pub fn with_action(mut self, controller: impl Into<String>, action: impl Into<String>) -> Self {
    let inner = Arc::make_mut(&mut self.inner);
    inner.controller = Some(controller.into());
    inner.action = Some(action.into());
    self
  }

  pub fn with_session(mut self, session: Arc<dyn SessionStore>) -> Self {
    Arc::make_mut(&mut self.inner).session = Some(session);
    self
  }

  /// Attach host state (current user, database handle, ...) for thunks.
  pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
    Arc::make_mut(&mut self.inner).data = Some(Arc::new(data));
    self
  }

  pub fn method(&self) -> &str {
    &self.inner.method
  }

  pub fn url(&self) -> &str {
    &self.inner.url
  }

  pub fn headers(&self) -> &InertiaHeaders {
    &self.inner.headers
  }

  pub fn is_inertia(&self) -> bool {
    self.inner.headers.inertia
  }

  pub fn controller(&self) -> Option<&str> {
    self.inner.controller.as_deref()
  }

  pub fn action(&self) -> Option<&str> {
    self.inner.action.as_deref()
  }

  pub fn session(&self) -> Option<&Arc<dyn SessionStore>> {
    self.inner.session.as_ref()
  }

  pub fn data<T: Any>(&self) -> Option<&T> {
    self.inner.data.as_deref().and_then(|d| d.downcast_ref::<T>())
  }
}

impl std::fmt::Debug for RequestContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RequestContext")
      .field("method", &self.inner.method)
      .field("url", &self.inner.url)
      .field("controller", &self.inner.controller)
      .field("action", &self.inner.action)
      .field("inertia", &self.inner.headers.inertia)
      .finish()
  }
}
