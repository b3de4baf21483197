/* src/server/core/rust/src/registry.rs */

//! Shared prop and meta contributions, layered by scope.
//!
//! A scope (the server-wide global scope, a reusable module, a controller)
//! owns an ordered list of layers. A child scope sees its parent's layers
//! first and its own after, so later layers override earlier ones by key.
//! The flattened list is frozen the first time it is read; registering
//! another layer after that is an error.

use std::sync::{Arc, OnceLock};

use inertia_engine::{MetaTag, MetaTags};
use parking_lot::Mutex;

use crate::context::RequestContext;
use crate::errors::InertiaError;
use crate::filter::ActionFilter;
use crate::props::Props;

pub type PropsFn = Arc<dyn Fn(&RequestContext) -> Props + Send + Sync>;
pub type MetaFn = Arc<dyn Fn(&RequestContext) -> Vec<MetaTag> + Send + Sync>;

#[derive(Clone)]
enum Contribution {
  Props(Props),
  PropsFn(PropsFn),
  Meta(Vec<MetaTag>),
  MetaFn(MetaFn),
}

/// One registration: static props or meta, or a provider computing them per
/// request, optionally guarded by an [`ActionFilter`].
#[derive(Clone)]
pub struct Layer {
  contribution: Contribution,
  filter: Option<ActionFilter>,
}

impl Layer {
  pub fn props(props: Props) -> Self {
    Self { contribution: Contribution::Props(props), filter: None }
  }

  pub fn props_fn<F>(f: F) -> Self
  where
    F: Fn(&RequestContext) -> Props + Send + Sync + 'static,
  {
    Self { contribution: Contribution::PropsFn(Arc::new(f)), filter: None }
  }

  pub fn meta(tags: impl IntoIterator<Item = MetaTag>) -> Self {
    Self { contribution: Contribution::Meta(tags.into_iter().collect()), filter: None }
  }

  pub fn meta_fn<F>(f: F) -> Self
  where
    F: Fn(&RequestContext) -> Vec<MetaTag> + Send + Sync + 'static,
  {
    Self { contribution: Contribution::MetaFn(Arc::new(f)), filter: None }
  }

  pub fn filter(mut self, filter: ActionFilter) -> Self {
    self.filter = Some(filter);
    self
  }

  fn applies(&self, ctx: &RequestContext) -> bool {
    self.filter.as_ref().is_none_or(|f| f.passes(ctx))
  }

  fn validate(&self, scope: &str, actions: Option<&[String]>) -> Result<(), InertiaError> {
    match (&self.filter, actions) {
      (Some(filter), Some(actions)) => filter.validate(scope, actions),
      _ => Ok(()),
    }
  }
}

/// What a scope contributes to one request.
#[derive(Debug, Default)]
pub struct Contributions {
  pub props: Props,
  pub meta: MetaTags,
}

pub struct Scope {
  name: String,
  /// Declared actions. `None` for scopes that are not bound to a
  /// controller (global, reusable modules); their filters are checked once
  /// a controller inherits them.
  actions: Option<Vec<String>>,
  parent: Option<Arc<Scope>>,
  pending: Mutex<Vec<Layer>>,
  frozen: OnceLock<Arc<[Layer]>>,
}

impl Scope {
  /// A scope not bound to any action set.
  pub fn module(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      actions: None,
      parent: None,
      pending: Mutex::new(Vec::new()),
      frozen: OnceLock::new(),
    }
  }

  /// A controller scope with its declared actions.
  pub fn controller<I, S>(name: impl Into<String>, actions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut scope = Self::module(name);
    scope.actions = Some(actions.into_iter().map(Into::into).collect());
    scope
  }

  /// Inherit `parent`'s layers. Filters the parent registered are checked
  /// against this scope's actions, and the parent is frozen.
  pub fn inherit(mut self, parent: Arc<Scope>) -> Result<Self, InertiaError> {
    let inherited = parent.layers();
    for layer in inherited.iter() {
      layer.validate(&self.name, self.actions.as_deref())?;
    }
    self.parent = Some(parent);
    Ok(self)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn actions(&self) -> Option<&[String]> {
    self.actions.as_deref()
  }

  pub fn is_frozen(&self) -> bool {
    self.frozen.get().is_some()
  }

  pub fn add(&self, layer: Layer) -> Result<(), InertiaError> {
    layer.validate(&self.name, self.actions.as_deref())?;
    let mut pending = self.pending.lock();
    if self.is_frozen() {
      return Err(InertiaError::RegistryFrozen(self.name.clone()));
    }
    pending.push(layer);
    Ok(())
  }

  pub fn share(&self, props: Props) -> Result<(), InertiaError> {
    self.add(Layer::props(props))
  }

  pub fn share_fn<F>(&self, f: F) -> Result<(), InertiaError>
  where
    F: Fn(&RequestContext) -> Props + Send + Sync + 'static,
  {
    self.add(Layer::props_fn(f))
  }

  pub fn share_meta(&self, tags: impl IntoIterator<Item = MetaTag>) -> Result<(), InertiaError> {
    self.add(Layer::meta(tags))
  }

  /// Parent layers followed by this scope's own. Freezes the scope.
  pub fn layers(&self) -> Arc<[Layer]> {
    if let Some(layers) = self.frozen.get() {
      return layers.clone();
    }
    let pending = self.pending.lock();
    self
      .frozen
      .get_or_init(|| {
        let mut all: Vec<Layer> =
          self.parent.as_ref().map(|p| p.layers().to_vec()).unwrap_or_default();
        all.extend(pending.iter().cloned());
        all.into()
      })
      .clone()
  }

  /// Evaluate every layer that applies to this request, in order.
  pub fn collect(&self, ctx: &RequestContext, deep_merge: bool) -> Contributions {
    let mut out = Contributions::default();
    for layer in self.layers().iter().filter(|l| l.applies(ctx)) {
      match layer.contribution {
        Contribution::Props(ref props) => merge_into(&mut out.props, props.clone(), deep_merge),
        Contribution::PropsFn(ref f) => merge_into(&mut out.props, f(ctx), deep_merge),
        Contribution::Meta(ref tags) => {
          out.meta.add_all(tags.iter().cloned());
        }
        Contribution::MetaFn(ref f) => {
          out.meta.add_all(f(ctx));
        }
      }
    }
    out
  }
}

fn merge_into(target: &mut Props, props: Props, deep: bool) {
  if deep { target.deep_merge(props) } else { target.merge(props) }
}

impl std::fmt::Debug for Scope {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scope")
      .field("name", &self.name)
      .field("actions", &self.actions)
      .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
      .field("frozen", &self.is_frozen())
      .finish()
  }
}
