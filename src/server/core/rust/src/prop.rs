/* src/server/core/rust/src/prop.rs */

//! Prop variants.
//!
//! A prop is a source (literal value, async thunk, or nested container)
//! plus a set of independent capability flags. Resolution branches on the
//! flags; there is no type per variant.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::errors::InertiaError;
use crate::props::Props;
use crate::scroll::ScrollSpec;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub type PropFuture = BoxFuture<Result<Value, InertiaError>>;
pub type PropFn = Arc<dyn Fn(RequestContext) -> PropFuture + Send + Sync>;

pub const DEFAULT_GROUP: &str = "default";

#[derive(Clone)]
pub enum PropSource {
  Value(Value),
  Thunk(PropFn),
  /// Nested container whose children are selected and resolved individually.
  Object(Props),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
  /// Left out of full reloads; only sent when a partial reload asks for it.
  pub ignore_on_first_load: bool,
  /// Advertised in `deferredProps` under `group` on full reloads.
  pub deferred: bool,
  pub group: Option<String>,
  /// Sent on every response, whatever the partial reload headers say.
  pub always: bool,
  pub merge: bool,
  pub deep_merge: bool,
  /// Shallow merge at the front instead of the back.
  pub prepend: bool,
  pub append_paths: Vec<String>,
  pub prepend_paths: Vec<String>,
  pub match_on: Vec<String>,
  pub once: bool,
  pub once_key: Option<String>,
  pub expires_in: Option<Duration>,
  /// Declared through the deprecated `lazy` alias.
  pub lazy: bool,
}

impl Capabilities {
  pub fn is_mergeable(&self) -> bool {
    self.merge || self.deep_merge
  }

  pub fn group_name(&self) -> &str {
    self.group.as_deref().unwrap_or(DEFAULT_GROUP)
  }
}

#[derive(Clone)]
pub struct Prop {
  source: PropSource,
  caps: Capabilities,
  scroll: Option<Arc<ScrollSpec>>,
}

impl Prop {
  fn with_source(source: PropSource) -> Self {
    Self { source, caps: Capabilities::default(), scroll: None }
  }

  pub fn value(value: impl Into<Value>) -> Self {
    Self::with_source(PropSource::Value(value.into()))
  }

  /// Serialize any value into a literal prop.
  pub fn serialize<T: Serialize>(value: &T) -> Result<Self, InertiaError> {
    Ok(Self::value(serde_json::to_value(value)?))
  }

  /// Async thunk evaluated only when the prop is selected for a response.
  pub fn from_fn<F, Fut, T>(f: F) -> Self
  where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, InertiaError>> + Send + 'static,
    T: Serialize,
  {
    let thunk: PropFn = Arc::new(move |ctx: RequestContext| -> PropFuture {
      let fut = f(ctx);
      Box::pin(async move {
        let value = fut.await?;
        Ok(serde_json::to_value(value)?)
      })
    });
    Self::with_source(PropSource::Thunk(thunk))
  }

  /// Synchronous thunk, for cheap computations that still should not run
  /// when the prop is not selected.
  pub fn from_sync<F, T>(f: F) -> Self
  where
    F: Fn(&RequestContext) -> T + Send + Sync + 'static,
    T: Serialize,
  {
    let thunk: PropFn = Arc::new(move |ctx: RequestContext| -> PropFuture {
      let result = serde_json::to_value(f(&ctx)).map_err(InertiaError::from);
      Box::pin(async move { result })
    });
    Self::with_source(PropSource::Thunk(thunk))
  }

  pub fn object(props: Props) -> Self {
    Self::with_source(PropSource::Object(props))
  }

  pub fn source(&self) -> &PropSource {
    &self.source
  }

  pub fn capabilities(&self) -> &Capabilities {
    &self.caps
  }

  pub fn scroll_spec(&self) -> Option<&ScrollSpec> {
    self.scroll.as_deref()
  }

  /// A literal value that is not wrapped in any capability.
  pub fn is_plain_value(&self) -> bool {
    matches!(self.source, PropSource::Value(_))
      && self.caps == Capabilities::default()
      && self.scroll.is_none()
  }

  /// Nested children when this prop is a walkable container: an explicit
  /// container, or a non-empty literal JSON object without capabilities.
  pub fn children(&self) -> Option<Props> {
    match self.source {
      PropSource::Object(ref props) => Some(props.clone()),
      PropSource::Value(Value::Object(ref map))
        if !map.is_empty() && self.caps == Capabilities::default() && self.scroll.is_none() =>
      {
        Some(map.iter().map(|(k, v)| (k.clone(), Prop::value(v.clone()))).collect())
      }
      _ => None,
    }
  }

  // -- Capability builders --

  pub fn optional(mut self) -> Self {
    self.caps.ignore_on_first_load = true;
    self
  }

  pub fn defer(mut self) -> Self {
    self.caps.ignore_on_first_load = true;
    self.caps.deferred = true;
    self
  }

  /// Defer into a named group; keys in one group are fetched together.
  pub fn group(mut self, group: impl Into<String>) -> Self {
    self.caps.group = Some(group.into());
    self.defer()
  }

  pub fn always(mut self) -> Self {
    self.caps.always = true;
    self
  }

  pub fn merge(mut self) -> Self {
    self.caps.merge = true;
    self
  }

  pub fn deep_merge(mut self) -> Self {
    self.caps.deep_merge = true;
    self
  }

  pub fn prepend(mut self) -> Self {
    self.caps.merge = true;
    self.caps.prepend = true;
    self
  }

  /// Append new items at a nested path (relative to the prop).
  pub fn append_at(mut self, path: impl Into<String>) -> Self {
    self.caps.merge = true;
    self.caps.append_paths.push(path.into());
    self
  }

  /// Prepend new items at a nested path (relative to the prop).
  pub fn prepend_at(mut self, path: impl Into<String>) -> Self {
    self.caps.merge = true;
    self.caps.prepend_paths.push(path.into());
    self
  }

  /// Field the client matches list entries on instead of blindly
  /// concatenating, relative to the prop (`"id"`, `"data.id"`).
  pub fn match_on(mut self, key: impl Into<String>) -> Self {
    self.caps.match_on.push(key.into());
    self
  }

  pub fn once(mut self) -> Self {
    self.caps.once = true;
    self
  }

  pub fn once_key(mut self, key: impl Into<String>) -> Self {
    self.caps.once = true;
    self.caps.once_key = Some(key.into());
    self
  }

  pub fn expires_in(mut self, ttl: Duration) -> Self {
    self.caps.once = true;
    self.caps.expires_in = Some(ttl);
    self
  }

  pub fn scroll(mut self, spec: ScrollSpec) -> Self {
    self.caps.merge = true;
    self.scroll = Some(Arc::new(spec));
    self
  }

  /// Reject flag combinations that have no meaning.
  pub fn validate(&self, key: &str) -> Result<(), InertiaError> {
    if self.caps.merge && self.caps.deep_merge {
      return Err(InertiaError::ConflictingMerge(key.to_string()));
    }
    if self.caps.once && matches!(self.source, PropSource::Object(_)) {
      return Err(InertiaError::Config(format!(
        "prop `{key}` is a container and cannot be once; make it a thunk returning the object"
      )));
    }
    Ok(())
  }
}

impl From<Value> for Prop {
  fn from(value: Value) -> Self {
    Self::value(value)
  }
}

impl From<Props> for Prop {
  fn from(props: Props) -> Self {
    Self::object(props)
  }
}

impl std::fmt::Debug for Prop {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let source = match self.source {
      PropSource::Value(ref v) => format!("Value({v})"),
      PropSource::Thunk(_) => "Thunk".to_string(),
      PropSource::Object(ref p) => format!("Object({} keys)", p.len()),
    };
    f.debug_struct("Prop")
      .field("source", &source)
      .field("caps", &self.caps)
      .field("scroll", &self.scroll.is_some())
      .finish()
  }
}

// -- Free constructors, mirroring the protocol's prop vocabulary --

/// Sent only when a partial reload asks for it.
pub fn optional(prop: Prop) -> Prop {
  prop.optional()
}

/// Old name for [`optional`]; scheduled for removal in 1.0.
#[deprecated(since = "0.6.0", note = "use `optional` instead")]
pub fn lazy(prop: Prop) -> Prop {
  let mut prop = prop.optional();
  prop.caps.lazy = true;
  prop
}

/// Left out of the first load and fetched by the client right after, in the
/// default group.
pub fn defer(prop: Prop) -> Prop {
  prop.defer()
}

pub fn defer_in(group: impl Into<String>, prop: Prop) -> Prop {
  prop.group(group)
}

pub fn always(prop: Prop) -> Prop {
  prop.always()
}

pub fn merge(prop: Prop) -> Prop {
  prop.merge()
}

pub fn deep_merge(prop: Prop) -> Prop {
  prop.deep_merge()
}

pub fn once(prop: Prop) -> Prop {
  prop.once()
}

pub fn scroll(spec: ScrollSpec, prop: Prop) -> Prop {
  prop.scroll(spec)
}
