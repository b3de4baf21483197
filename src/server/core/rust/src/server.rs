/* src/server/core/rust/src/server.rs */

use std::sync::Arc;

use dashmap::DashMap;
use inertia_engine::MetaTag;
use serde_json::Value;

use crate::config::InertiaConfig;
use crate::context::{RequestContext, SessionStore};
use crate::errors::InertiaError;
use crate::headers::InertiaHeaders;
use crate::notify::{Advisories, Notifier};
use crate::once::{OnceCache, OnceStore};
use crate::props::Props;
use crate::registry::{Layer, Scope};
use crate::resolve::NameTransform;
use crate::scroll::{ScrollAdapter, ScrollAdapters};
use crate::side_channel;
use crate::ssr::SsrClient;
use crate::version::{self, Version};

pub type VersionFn = Arc<dyn Fn() -> Option<Version> + Send + Sync>;
pub type ValueTransform = Arc<dyn Fn(Value) -> Value + Send + Sync>;
/// `(scope, action) -> component`.
pub type ComponentResolver = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

pub const GLOBAL_SCOPE: &str = "global";

/// Builder collecting configuration, hooks and server-wide shared props.
pub struct InertiaServer {
  config: InertiaConfig,
  version_fn: Option<VersionFn>,
  layers: Vec<Layer>,
  once_store: Option<Arc<dyn OnceStore>>,
  scroll: ScrollAdapters,
  names: Option<Arc<NameTransform>>,
  values: Option<ValueTransform>,
  components: ComponentResolver,
  notifier: Option<Arc<dyn Notifier>>,
}

impl InertiaServer {
  pub fn new() -> Self {
    Self {
      config: InertiaConfig::default(),
      version_fn: None,
      layers: Vec::new(),
      once_store: None,
      scroll: ScrollAdapters::with_defaults(),
      names: None,
      values: None,
      components: Arc::new(|scope: &str, action: &str| format!("{scope}/{action}")),
      notifier: None,
    }
  }

  pub fn config(mut self, config: InertiaConfig) -> Self {
    self.config = config;
    self
  }

  pub fn version(mut self, version: impl Into<Version>) -> Self {
    self.config.version = Some(version.into());
    self
  }

  /// Compute the version per request, e.g. from a manifest hash that
  /// changes on deploy. Takes priority over a static version.
  pub fn version_fn<F>(mut self, f: F) -> Self
  where
    F: Fn() -> Option<Version> + Send + Sync + 'static,
  {
    self.version_fn = Some(Arc::new(f));
    self
  }

  pub fn share(mut self, props: Props) -> Self {
    self.layers.push(Layer::props(props));
    self
  }

  pub fn share_fn<F>(mut self, f: F) -> Self
  where
    F: Fn(&RequestContext) -> Props + Send + Sync + 'static,
  {
    self.layers.push(Layer::props_fn(f));
    self
  }

  /// Any layer, including filtered ones.
  pub fn layer(mut self, layer: Layer) -> Self {
    self.layers.push(layer);
    self
  }

  pub fn meta(mut self, tags: impl IntoIterator<Item = MetaTag>) -> Self {
    self.layers.push(Layer::meta(tags));
    self
  }

  pub fn once_store(mut self, store: Arc<dyn OnceStore>) -> Self {
    self.once_store = Some(store);
    self
  }

  /// Register a pagination adapter; it is consulted before earlier ones.
  pub fn scroll_adapter(mut self, adapter: Arc<dyn ScrollAdapter>) -> Self {
    self.scroll.register(adapter);
    self
  }

  pub fn transform_keys<F>(mut self, f: F) -> Self
  where
    F: Fn(&str) -> String + Send + Sync + 'static,
  {
    self.names = Some(Arc::new(f));
    self
  }

  pub fn camel_case_keys(self) -> Self {
    self.transform_keys(inertia_engine::camel_case)
  }

  /// Rewrite the final props object just before it is serialized.
  pub fn transform_props<F>(mut self, f: F) -> Self
  where
    F: Fn(Value) -> Value + Send + Sync + 'static,
  {
    self.values = Some(Arc::new(f));
    self
  }

  pub fn component_resolver<F>(mut self, f: F) -> Self
  where
    F: Fn(&str, &str) -> String + Send + Sync + 'static,
  {
    self.components = Arc::new(f);
    self
  }

  /// Receive advisories in addition to the `warn` logs.
  pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = Some(notifier);
    self
  }

  pub fn build(self) -> Result<InertiaEngine, InertiaError> {
    let global = Scope::module(GLOBAL_SCOPE);
    for layer in self.layers {
      global.add(layer)?;
    }
    let ssr =
      if self.config.ssr_enabled { Some(SsrClient::new(&self.config.ssr_url)?) } else { None };
    let once = match self.once_store {
      Some(store) => OnceCache::new(store),
      None => OnceCache::memory(),
    };
    tracing::debug!(ssr = ssr.is_some(), version = ?self.config.version, "inertia engine ready");
    Ok(InertiaEngine {
      config: self.config,
      version_fn: self.version_fn,
      global: Arc::new(global),
      scopes: DashMap::new(),
      once,
      scroll: self.scroll,
      names: self.names,
      values: self.values,
      components: self.components,
      notifier: Arc::new(Advisories::new(self.notifier)),
      ssr,
    })
  }
}

impl Default for InertiaServer {
  fn default() -> Self {
    Self::new()
  }
}

/// The built protocol engine, shared by every request.
pub struct InertiaEngine {
  pub(crate) config: InertiaConfig,
  pub(crate) version_fn: Option<VersionFn>,
  pub(crate) global: Arc<Scope>,
  pub(crate) scopes: DashMap<String, Arc<Scope>>,
  pub(crate) once: OnceCache,
  pub(crate) scroll: ScrollAdapters,
  pub(crate) names: Option<Arc<NameTransform>>,
  pub(crate) values: Option<ValueTransform>,
  pub(crate) components: ComponentResolver,
  pub(crate) notifier: Arc<dyn Notifier>,
  pub(crate) ssr: Option<SsrClient>,
}

impl InertiaEngine {
  pub fn config(&self) -> &InertiaConfig {
    &self.config
  }

  pub fn global(&self) -> &Arc<Scope> {
    &self.global
  }

  /// Create and mount a controller scope inheriting the global one.
  pub fn controller<I, S>(&self, name: &str, actions: I) -> Result<Arc<Scope>, InertiaError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let scope = Scope::controller(name, actions).inherit(self.global.clone())?;
    Ok(self.mount(scope))
  }

  /// Mount a scope built elsewhere (for example one inheriting a shared
  /// module). Requests naming its controller read from it.
  pub fn mount(&self, scope: Scope) -> Arc<Scope> {
    let scope = Arc::new(scope);
    self.scopes.insert(scope.name().to_string(), scope.clone());
    scope
  }

  /// The scope serving this request: its controller's, else the global one.
  pub fn scope_for(&self, ctx: &RequestContext) -> Arc<Scope> {
    ctx
      .controller()
      .and_then(|c| self.scopes.get(c).map(|s| s.value().clone()))
      .unwrap_or_else(|| self.global.clone())
  }

  pub fn once_cache(&self) -> &OnceCache {
    &self.once
  }

  pub fn notifier(&self) -> &dyn Notifier {
    self.notifier.as_ref()
  }

  pub fn version(&self) -> Option<Version> {
    match self.version_fn {
      Some(ref f) => f(),
      None => self.config.version.clone(),
    }
  }

  /// A protocol GET whose asset version no longer matches.
  pub fn is_stale(&self, method: &str, headers: &InertiaHeaders) -> bool {
    headers.inertia
      && method.eq_ignore_ascii_case("GET")
      && version::is_stale(self.version().as_ref(), headers.version.as_deref())
  }

  /// Store validation errors for the page rendered after the redirect.
  pub fn redirect_with_errors(
    &self,
    ctx: &RequestContext,
    errors: Value,
  ) -> Result<(), InertiaError> {
    let session = require_session(ctx)?;
    side_channel::put_errors(session.as_ref(), errors, self.notifier.as_ref());
    Ok(())
  }

  pub fn redirect_with_flash(
    &self,
    ctx: &RequestContext,
    flash: serde_json::Map<String, Value>,
  ) -> Result<(), InertiaError> {
    let session = require_session(ctx)?;
    side_channel::put_flash(session.as_ref(), flash);
    Ok(())
  }

  /// Clear the client's history state on the next rendered page.
  pub fn clear_history(&self, ctx: &RequestContext) -> Result<(), InertiaError> {
    let session = require_session(ctx)?;
    side_channel::request_clear_history(session.as_ref());
    Ok(())
  }
}

fn require_session(ctx: &RequestContext) -> Result<&Arc<dyn SessionStore>, InertiaError> {
  ctx
    .session()
    .ok_or_else(|| InertiaError::Config("no session store attached to the request".into()))
}

impl std::fmt::Debug for InertiaEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InertiaEngine")
      .field("config", &self.config)
      .field("scopes", &self.scopes.len())
      .field("scroll_adapters", &self.scroll.len())
      .field("ssr", &self.ssr.is_some())
      .finish_non_exhaustive()
  }
}
