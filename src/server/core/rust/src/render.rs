/* src/server/core/rust/src/render.rs */

use inertia_engine::{
  DEFAULT_SHELL, MetaTag, MetaTags, Page, inject_head, inject_page_root, page_root_element,
};
use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::errors::InertiaError;
use crate::prop::Prop;
use crate::props::Props;
use crate::resolve::Resolver;
use crate::server::InertiaEngine;
use crate::side_channel;

/// Props key carrying the serialized head tags.
pub const META_PROP: &str = "_inertia_meta";
pub const ERRORS_PROP: &str = "errors";

/// One page render requested by a handler.
#[derive(Debug, Default)]
pub struct Render {
  component: Option<String>,
  props: Props,
  meta: MetaTags,
  encrypt_history: Option<bool>,
  clear_history: bool,
}

impl Render {
  pub fn component(name: impl Into<String>) -> Self {
    Self { component: Some(name.into()), ..Self::default() }
  }

  /// Component derived from the request's scope and action.
  pub fn action() -> Self {
    Self::default()
  }

  pub fn props(mut self, props: Props) -> Self {
    self.props.merge(props);
    self
  }

  pub fn prop(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
    self.props.insert(key, prop);
    self
  }

  pub fn meta(mut self, tag: MetaTag) -> Self {
    self.meta.add(tag);
    self
  }

  pub fn encrypt_history(mut self, encrypt: bool) -> Self {
    self.encrypt_history = Some(encrypt);
    self
  }

  pub fn clear_history(mut self) -> Self {
    self.clear_history = true;
    self
  }
}

/// A resolved page plus the head tags that went into it.
#[derive(Debug, Clone)]
pub struct RenderedPage {
  pub page: Page,
  pub meta: MetaTags,
}

impl InertiaEngine {
  fn component_for(&self, ctx: &RequestContext, render: &Render) -> Result<String, InertiaError> {
    if let Some(ref name) = render.component {
      return Ok(name.clone());
    }
    match (ctx.controller(), ctx.action()) {
      (Some(scope), Some(action)) => Ok((self.components)(scope, action)),
      _ => Err(InertiaError::Config(
        "render without a component needs the request's controller and action".into(),
      )),
    }
  }

  /// Errors from the side channel, scoped by `X-Inertia-Error-Bag`.
  fn errors_prop(&self, ctx: &RequestContext) -> Prop {
    let errors = ctx
      .session()
      .map(|s| side_channel::errors(s.as_ref(), self.notifier.as_ref()))
      .unwrap_or_default();
    let value = match ctx.headers().error_bag {
      Some(ref bag) if !errors.is_empty() => {
        let mut scoped = Map::new();
        scoped.insert(bag.clone(), Value::Object(errors));
        Value::Object(scoped)
      }
      _ => Value::Object(errors),
    };
    Prop::value(value).always()
  }

  pub async fn render_page(
    &self,
    ctx: &RequestContext,
    render: Render,
  ) -> Result<RenderedPage, InertiaError> {
    let component = self.component_for(ctx, &render)?;
    let deep = self.config.deep_merge_shared_data;

    let contributions = self.scope_for(ctx).collect(ctx, deep);
    let mut props = Props::new().with(ERRORS_PROP, self.errors_prop(ctx));
    props.merge(contributions.props);
    if deep {
      props.deep_merge(render.props);
    } else {
      props.merge(render.props);
    }

    let mut meta = contributions.meta;
    meta.merge(render.meta);

    let mut resolver = Resolver::new(ctx, &component, &self.once, &self.scroll);
    if let Some(ref names) = self.names {
      resolver = resolver.name_transform(names.as_ref());
    }
    let resolved = resolver.resolve(&props).await?;
    if !resolved.unoptimized.is_empty() {
      self.notifier.unoptimized_partial_render(&component, &resolved.unoptimized);
    }
    for path in &resolved.deprecated {
      self.notifier.deprecated(&format!("prop `{path}` uses `lazy`; use `optional` instead"));
    }

    let mut props = match self.values {
      Some(ref transform) => match transform(Value::Object(resolved.props)) {
        Value::Object(map) => map,
        other => {
          let message = format!("props transform returned a non-object: {other}");
          return Err(InertiaError::internal(message));
        }
      },
      None => resolved.props,
    };
    if !meta.is_empty() {
      props.insert(META_PROP.to_string(), meta.to_value());
    }

    let session = ctx.session();
    let mut page = Page::new(component, ctx.url());
    page.props = props;
    page.version = self.version().map_or(Value::Null, |v| v.to_value());
    page.merge_props = resolved.merge_props;
    page.prepend_props = resolved.prepend_props;
    page.deep_merge_props = resolved.deep_merge_props;
    page.match_props_on = resolved.match_props_on;
    page.deferred_props = resolved.deferred_props;
    page.scroll_props = resolved.scroll_props;
    page.flash = session.and_then(|s| side_channel::flash(s.as_ref()));
    page.encrypt_history = render.encrypt_history.unwrap_or(self.config.encrypt_history);
    page.clear_history =
      session.is_some_and(|s| side_channel::take_clear_history(s.as_ref())) || render.clear_history;

    Ok(RenderedPage { page, meta })
  }

  /// Full HTML document for a non-protocol request. SSR is tried first when
  /// enabled; any SSR failure falls back to client-side rendering.
  pub async fn render_document(&self, rendered: &RenderedPage) -> Result<String, InertiaError> {
    let template = self.config.root_template.as_deref().unwrap_or(DEFAULT_SHELL);

    if let Some(ref ssr) = self.ssr {
      match ssr.render(&rendered.page).await {
        Ok(response) => {
          let html = inject_head(template, &response.head.join("\n"));
          return Ok(inject_page_root(&html, &response.body));
        }
        Err(e) => {
          tracing::warn!(
            component = %rendered.page.component,
            error = %e,
            "SSR failed, rendering on the client"
          );
        }
      }
    }

    let json = serde_json::to_string(&rendered.page)?;
    let html = inject_head(template, &rendered.meta.to_html());
    Ok(inject_page_root(&html, &page_root_element(&self.config.root_id, &json)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::InertiaConfig;
  use crate::context::MemorySession;
  use crate::filter::ActionFilter;
  use crate::headers::InertiaHeaders;
  use crate::notify::Notifier;
  use crate::prop::{defer, optional};
  use crate::registry::Layer;
  use crate::server::InertiaServer;
  use serde_json::json;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn ctx(pairs: &[(&str, &str)]) -> RequestContext {
    RequestContext::new("GET", "/users", InertiaHeaders::from_pairs(pairs.iter().copied()))
  }

  fn inertia() -> RequestContext {
    ctx(&[("X-Inertia", "true")])
  }

  #[tokio::test]
  async fn page_shape_on_full_load() {
    let engine = InertiaServer::new().version("v1").build().unwrap();
    let rendered = engine
      .render_page(&inertia(), Render::component("Users/Index").prop("name", json!("Brandon")))
      .await
      .unwrap();
    let wire = serde_json::to_value(&rendered.page).unwrap();
    assert_eq!(
      wire,
      json!({
        "component": "Users/Index",
        "props": {"errors": {}, "name": "Brandon"},
        "url": "/users",
        "version": "v1",
        "encryptHistory": false,
        "clearHistory": false,
      })
    );
  }

  #[tokio::test]
  async fn shared_then_action_props() {
    let engine = InertiaServer::new()
      .share(Props::new().with("app", json!("demo")).with("title", json!("shared")))
      .build()
      .unwrap();
    let rendered = engine
      .render_page(&inertia(), Render::component("Home").prop("title", json!("action")))
      .await
      .unwrap();
    assert_eq!(rendered.page.props["app"], json!("demo"));
    assert_eq!(rendered.page.props["title"], json!("action"));
  }

  #[tokio::test]
  async fn component_from_action() {
    let engine = InertiaServer::new().build().unwrap();
    engine.controller("users", ["index"]).unwrap();
    let ctx = inertia().with_action("users", "index");
    let rendered = engine.render_page(&ctx, Render::action()).await.unwrap();
    assert_eq!(rendered.page.component, "users/index");

    let err = engine.render_page(&inertia(), Render::action()).await.unwrap_err();
    assert_eq!(err.code(), "CONFIG_ERROR");
  }

  #[tokio::test]
  async fn errors_and_flash_from_session() {
    let engine = InertiaServer::new().build().unwrap();
    let session = Arc::new(MemorySession::new());
    let ctx = ctx(&[("X-Inertia", "true"), ("X-Inertia-Error-Bag", "login")])
      .with_session(session.clone());
    let flash = json!({"notice": "hi"}).as_object().cloned().unwrap();
    engine.redirect_with_errors(&ctx, json!({"email": "taken"})).unwrap();
    engine.redirect_with_flash(&ctx, flash).unwrap();
    engine.clear_history(&ctx).unwrap();

    let rendered = engine.render_page(&ctx, Render::component("Login")).await.unwrap();
    assert_eq!(rendered.page.props["errors"], json!({"login": {"email": "taken"}}));
    assert_eq!(rendered.page.flash, json!({"notice": "hi"}).as_object().cloned());
    assert!(rendered.page.clear_history);
  }

  #[tokio::test]
  async fn errors_survive_partial_except() {
    let engine = InertiaServer::new().build().unwrap();
    let ctx = ctx(&[
      ("X-Inertia", "true"),
      ("X-Inertia-Partial-Component", "Users/Index"),
      ("X-Inertia-Partial-Data", "users"),
      ("X-Inertia-Partial-Except", "errors"),
    ]);
    let render = Render::component("Users/Index")
      .prop("users", json!([]))
      .prop("stats", optional(Prop::value(1)));
    let rendered = engine.render_page(&ctx, render).await.unwrap();
    assert_eq!(Value::Object(rendered.page.props), json!({"errors": {}, "users": []}));
  }

  #[tokio::test]
  async fn meta_is_deduplicated_and_attached() {
    let engine = InertiaServer::new().meta([MetaTag::name("description", "A")]).build().unwrap();
    let render = Render::component("Home")
      .meta(MetaTag::name("description", "B"))
      .meta(MetaTag::title("Home"));
    let rendered = engine.render_page(&inertia(), render).await.unwrap();
    assert_eq!(rendered.meta.len(), 2);
    let meta = rendered.page.props[META_PROP].as_array().cloned().unwrap();
    assert_eq!(meta.len(), 2);
    assert_eq!(meta[0]["content"], json!("B"));
    assert_eq!(meta[0]["headKey"], json!("meta-name-description"));
  }

  #[tokio::test]
  async fn filtered_meta_layers() {
    let engine = InertiaServer::new().build().unwrap();
    let scope = engine.controller("users", ["index", "show"]).unwrap();
    scope
      .add(Layer::meta([MetaTag::title("Users")]).filter(ActionFilter::new().only(["index"])))
      .unwrap();

    let index = inertia().with_action("users", "index");
    let index = engine.render_page(&index, Render::action()).await.unwrap();
    assert_eq!(index.meta.len(), 1);
    let show = inertia().with_action("users", "show");
    let show = engine.render_page(&show, Render::action()).await.unwrap();
    assert!(show.meta.is_empty());
    assert!(!show.page.props.contains_key(META_PROP));
  }

  #[derive(Default)]
  struct Recorder {
    unoptimized: AtomicUsize,
    deprecated: parking_lot::Mutex<Vec<String>>,
  }

  impl Notifier for Recorder {
    fn unoptimized_partial_render(&self, _component: &str, paths: &[String]) {
      self.unoptimized.fetch_add(paths.len(), Ordering::SeqCst);
    }

    fn deprecated(&self, message: &str) {
      self.deprecated.lock().push(message.to_string());
    }
  }

  #[tokio::test]
  async fn unoptimized_partial_render_is_reported() {
    let recorder = Arc::new(Recorder::default());
    let engine = InertiaServer::new().notifier(recorder.clone()).build().unwrap();
    let ctx = ctx(&[
      ("X-Inertia", "true"),
      ("X-Inertia-Partial-Component", "Home"),
      ("X-Inertia-Partial-Data", "lazy"),
    ]);
    let render = Render::component("Home")
      .prop("plain", json!(1))
      .prop("lazy", defer(Prop::from_sync(|_| 2)));
    let rendered = engine.render_page(&ctx, render).await.unwrap();
    assert_eq!(rendered.page.props["lazy"], json!(2));
    assert_eq!(recorder.unoptimized.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  #[allow(deprecated)]
  async fn lazy_props_reach_the_notifier() {
    let recorder = Arc::new(Recorder::default());
    let engine = InertiaServer::new().notifier(recorder.clone()).build().unwrap();
    let render = Render::component("Home").prop("sport", crate::prop::lazy(Prop::value("hockey")));
    let rendered = engine.render_page(&inertia(), render).await.unwrap();
    assert!(!rendered.page.props.contains_key("sport"));
    let messages = recorder.deprecated.lock().clone();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("`sport`"));
  }

  #[tokio::test]
  async fn camel_case_and_value_transform() {
    let engine = InertiaServer::new()
      .camel_case_keys()
      .transform_props(|mut v| {
        v["stamp"] = json!(true);
        v
      })
      .build()
      .unwrap();
    let rendered = engine
      .render_page(&inertia(), Render::component("Home").prop("user_name", json!("a")))
      .await
      .unwrap();
    assert_eq!(rendered.page.props["userName"], json!("a"));
    assert_eq!(rendered.page.props["stamp"], json!(true));
  }

  #[tokio::test]
  async fn document_embeds_escaped_page() {
    let config = InertiaConfig {
      root_template: Some("<html><head>@inertiaHead</head><body>@inertia</body></html>".into()),
      ..InertiaConfig::default()
    };
    let engine = InertiaServer::new().config(config).build().unwrap();
    let render = Render::component("Home")
      .prop("html", json!("<b>\"hi\"</b>"))
      .meta(MetaTag::title("Home"));
    let rendered = engine.render_page(&ctx(&[]), render).await.unwrap();
    let html = engine.render_document(&rendered).await.unwrap();
    assert!(html.contains("<title inertia=\"title\">Home</title>"));
    assert!(html.contains("<div id=\"app\" data-page=\""));
    assert!(!html.contains("@inertia"));
    assert!(!html.contains("<b>"));
  }

  #[tokio::test]
  async fn ssr_failure_falls_back() {
    let config = InertiaConfig {
      ssr_enabled: true,
      ssr_url: "http://127.0.0.1:1".into(),
      ..InertiaConfig::default()
    };
    let engine = InertiaServer::new().config(config).build().unwrap();
    let rendered = engine.render_page(&ctx(&[]), Render::component("Home")).await.unwrap();
    let html = engine.render_document(&rendered).await.unwrap();
    assert!(html.contains("data-page="));
  }
}
