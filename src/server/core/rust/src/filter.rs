/* src/server/core/rust/src/filter.rs */

use std::sync::Arc;

use crate::context::RequestContext;
use crate::errors::InertiaError;

pub type PredicateFn = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// One condition in a filter's `if` or `unless` list.
#[derive(Clone)]
pub enum Predicate {
  /// True when the current action is one of the named actions.
  Actions(Vec<String>),
  Custom(PredicateFn),
}

impl Predicate {
  pub fn matches(&self, ctx: &RequestContext) -> bool {
    match self {
      Self::Actions(names) => ctx.action().is_some_and(|a| names.iter().any(|n| n == a)),
      Self::Custom(f) => f(ctx),
    }
  }
}

impl std::fmt::Debug for Predicate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Actions(names) => f.debug_tuple("Actions").field(names).finish(),
      Self::Custom(_) => f.write_str("Custom"),
    }
  }
}

/// Decides whether a shared contribution applies to the current request.
///
/// `only`/`except` compile into action-name predicates on the `if`/`unless`
/// lists. The filter passes when every `if` predicate holds and no `unless`
/// predicate does.
#[derive(Clone, Debug, Default)]
pub struct ActionFilter {
  if_: Vec<Predicate>,
  unless: Vec<Predicate>,
}

impl ActionFilter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn only<I, S>(mut self, actions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.if_.push(Predicate::Actions(actions.into_iter().map(Into::into).collect()));
    self
  }

  pub fn except<I, S>(mut self, actions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.unless.push(Predicate::Actions(actions.into_iter().map(Into::into).collect()));
    self
  }

  /// Raw `if` predicate.
  pub fn when<F>(mut self, f: F) -> Self
  where
    F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
  {
    self.if_.push(Predicate::Custom(Arc::new(f)));
    self
  }

  /// Raw `unless` predicate.
  pub fn unless<F>(mut self, f: F) -> Self
  where
    F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
  {
    self.unless.push(Predicate::Custom(Arc::new(f)));
    self
  }

  pub fn passes(&self, ctx: &RequestContext) -> bool {
    self.if_.iter().all(|p| p.matches(ctx)) && !self.unless.iter().any(|p| p.matches(ctx))
  }

  /// Every action named by `only`/`except` must exist on the scope.
  pub fn validate(&self, scope: &str, actions: &[String]) -> Result<(), InertiaError> {
    let named = self.if_.iter().chain(&self.unless).filter_map(|p| match p {
      Predicate::Actions(names) => Some(names),
      Predicate::Custom(_) => None,
    });
    match named.flatten().find(|n| !actions.contains(n)) {
      Some(unknown) => {
        Err(InertiaError::UnknownAction { scope: scope.to_string(), action: unknown.clone() })
      }
      None => Ok(()),
    }
  }
}
