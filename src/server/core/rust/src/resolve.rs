/* src/server/core/rust/src/resolve.rs */

//! Prop resolution: walk the registered props, evaluate what the selector
//! keeps and record how the client should apply each value.

use std::collections::BTreeMap;

use futures_util::future::BoxFuture;
use inertia_engine::{ScrollMetadata, join_path, transform_keys, transform_path};
use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::errors::InertiaError;
use crate::headers::MergeIntent;
use crate::once::OnceCache;
use crate::prop::{Prop, PropSource};
use crate::props::Props;
use crate::scroll::ScrollAdapters;
use crate::selector::Selector;

pub type NameTransform = dyn Fn(&str) -> String + Send + Sync;

/// Evaluated props and the manifests describing them.
#[derive(Debug, Default, PartialEq)]
pub struct Resolved {
  pub props: Map<String, Value>,
  pub merge_props: Vec<String>,
  pub prepend_props: Vec<String>,
  pub deep_merge_props: Vec<String>,
  pub match_props_on: Vec<String>,
  pub deferred_props: BTreeMap<String, Vec<String>>,
  pub scroll_props: BTreeMap<String, ScrollMetadata>,
  /// Plain-valued top-level props a partial reload left out.
  pub unoptimized: Vec<String>,
  /// Props declared through the deprecated `lazy` alias.
  pub deprecated: Vec<String>,
}

pub struct Resolver<'a> {
  ctx: &'a RequestContext,
  component: &'a str,
  selector: Selector<'a>,
  once: &'a OnceCache,
  scroll: &'a ScrollAdapters,
  names: Option<&'a NameTransform>,
}

impl<'a> Resolver<'a> {
  pub fn new(
    ctx: &'a RequestContext,
    component: &'a str,
    once: &'a OnceCache,
    scroll: &'a ScrollAdapters,
  ) -> Self {
    Self {
      ctx,
      component,
      selector: Selector::new(component, ctx.headers()),
      once,
      scroll,
      names: None,
    }
  }

  /// Rename every object key and manifest path segment.
  pub fn name_transform(mut self, names: &'a NameTransform) -> Self {
    self.names = Some(names);
    self
  }

  pub fn selector(&self) -> &Selector<'a> {
    &self.selector
  }

  pub async fn resolve(&self, props: &Props) -> Result<Resolved, InertiaError> {
    validate(props, "")?;
    let mut out = Resolved::default();
    let resolved = self.walk(props, "", false, &mut out).await?;
    out.props = resolved;
    Ok(out)
  }

  fn name(&self, key: &str) -> String {
    match self.names {
      Some(f) => f(key),
      None => key.to_string(),
    }
  }

  fn wire_path(&self, path: &str) -> String {
    match self.names {
      Some(f) => transform_path(path, f),
      None => path.to_string(),
    }
  }

  fn walk<'b>(
    &'b self,
    props: &'b Props,
    parent: &'b str,
    forced: bool,
    out: &'b mut Resolved,
  ) -> BoxFuture<'b, Result<Map<String, Value>, InertiaError>> {
    Box::pin(async move {
      let mut resolved = Map::new();
      for (key, prop) in props.iter() {
        let path = join_path(parent, key);
        let wire = self.wire_path(&path);
        let caps = prop.capabilities();
        if caps.lazy {
          out.deprecated.push(path.clone());
        }

        if let Some(children) = prop.children() {
          let skipped_on_first_load =
            !forced && !caps.always && !self.selector.is_partial() && caps.ignore_on_first_load;
          if skipped_on_first_load {
            self.record_deferred(prop, &wire, out);
            continue;
          }
          let nested = self.walk(&children, &path, forced || caps.always, out).await?;
          if nested.is_empty() {
            if parent.is_empty() && prop.is_plain_value() && self.selector.is_partial() {
              out.unoptimized.push(path);
            }
            continue;
          }
          self.record_manifests(prop, &path, &wire, out)?;
          resolved.insert(self.name(key), Value::Object(nested));
          continue;
        }

        // headers name props the way the client saw them
        if !(forced || self.selector.keep(caps, &wire)) {
          if self.selector.is_partial() {
            if parent.is_empty() && prop.is_plain_value() {
              out.unoptimized.push(path);
            }
          } else {
            self.record_deferred(prop, &wire, out);
          }
          continue;
        }

        let value = self.evaluate(prop, &path).await?;
        let value = match self.names {
          Some(f) => transform_keys(value, f),
          None => value,
        };
        self.record_manifests(prop, &path, &wire, out)?;
        resolved.insert(self.name(key), value);
      }
      Ok(resolved)
    })
  }

  async fn evaluate(&self, prop: &Prop, path: &str) -> Result<Value, InertiaError> {
    let caps = prop.capabilities();
    if !caps.once {
      return self.compute(prop, path).await;
    }
    let key = match caps.once_key {
      Some(ref key) => key.clone(),
      None => format!("{}:{path}", self.component),
    };
    self.once.get_or_compute(&key, caps.expires_in, || self.compute(prop, path)).await
  }

  async fn compute(&self, prop: &Prop, path: &str) -> Result<Value, InertiaError> {
    match prop.source() {
      PropSource::Value(v) => Ok(v.clone()),
      PropSource::Thunk(f) => f(self.ctx.clone()).await.inspect_err(|e| {
        tracing::error!(prop = path, error = %e, "prop evaluation failed");
      }),
      PropSource::Object(_) => {
        Err(InertiaError::internal(format!("container `{path}` evaluated as a value")))
      }
    }
  }

  fn record_deferred(&self, prop: &Prop, wire: &str, out: &mut Resolved) {
    let caps = prop.capabilities();
    if caps.deferred && !self.selector.is_reset(wire) {
      let group = out.deferred_props.entry(caps.group_name().to_string()).or_default();
      group.push(wire.to_string());
    }
  }

  fn record_manifests(
    &self,
    prop: &Prop,
    path: &str,
    wire: &str,
    out: &mut Resolved,
  ) -> Result<(), InertiaError> {
    let caps = prop.capabilities();

    if let Some(spec) = prop.scroll_spec() {
      let wrapper = format!("{wire}.{}", self.wire_path(spec.wrapper_key()));
      if let Some(m) = spec.match_on_key() {
        out.match_props_on.push(format!("{wrapper}.{}", self.wire_path(m)));
      }
      match self.ctx.headers().merge_intent {
        MergeIntent::Prepend => out.prepend_props.push(wrapper),
        MergeIntent::Append => out.merge_props.push(wrapper),
      }
      let meta = self.scroll.metadata(path, spec, self.selector.is_reset(wire))?;
      out.scroll_props.insert(wire.to_string(), meta);
    } else if caps.deep_merge {
      out.deep_merge_props.push(wire.to_string());
    } else if caps.merge {
      if caps.append_paths.is_empty() && caps.prepend_paths.is_empty() {
        if caps.prepend {
          out.prepend_props.push(wire.to_string());
        } else {
          out.merge_props.push(wire.to_string());
        }
      }
      for p in &caps.append_paths {
        out.merge_props.push(format!("{wire}.{}", self.wire_path(p)));
      }
      for p in &caps.prepend_paths {
        out.prepend_props.push(format!("{wire}.{}", self.wire_path(p)));
      }
    }

    for m in &caps.match_on {
      out.match_props_on.push(format!("{wire}.{}", self.wire_path(m)));
    }
    Ok(())
  }
}

/// Reject conflicting flags anywhere in the tree before evaluating anything.
fn validate(props: &Props, parent: &str) -> Result<(), InertiaError> {
  for (key, prop) in props.iter() {
    let path = join_path(parent, key);
    prop.validate(&path)?;
    if let PropSource::Object(ref children) = *prop.source() {
      validate(children, &path)?;
    }
  }
  Ok(())
}
