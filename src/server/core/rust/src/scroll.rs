/* src/server/core/rust/src/scroll.rs */

//! Pagination metadata for scroll (infinite list) props.
//!
//! The paginator object handed to a scroll prop is opaque to the core. An
//! ordered adapter chain turns it into page numbers: the most recently
//! registered adapter is asked first and the first one that recognizes the
//! object wins. Fields no adapter produced fall back to values the caller
//! passed on the spec. `pageName` and `currentPage` are required.

use std::any::Any;
use std::sync::Arc;

use inertia_engine::ScrollMetadata;
use serde_json::Value;

use crate::errors::InertiaError;

pub const DEFAULT_WRAPPER: &str = "data";
pub const DEFAULT_PAGE_NAME: &str = "page";

/// Page numbers an adapter could read off a paginator. `None` means unknown;
/// `Some(Value::Null)` means known to be absent (no next page, say).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageInfo {
  pub page_name: Option<String>,
  pub previous_page: Option<Value>,
  pub next_page: Option<Value>,
  pub current_page: Option<Value>,
}

impl PageInfo {
  /// Fill fields that are still unknown from `fallback`.
  fn or(self, fallback: &PageInfo) -> PageInfo {
    PageInfo {
      page_name: self.page_name.or_else(|| fallback.page_name.clone()),
      previous_page: self.previous_page.or_else(|| fallback.previous_page.clone()),
      next_page: self.next_page.or_else(|| fallback.next_page.clone()),
      current_page: self.current_page.or_else(|| fallback.current_page.clone()),
    }
  }
}

pub trait ScrollAdapter: Send + Sync {
  /// Return page info when this adapter recognizes the paginator.
  fn extract(&self, paginator: &(dyn Any + Send + Sync)) -> Option<PageInfo>;
}

/// Offset pagination described by the current page and whether more exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated {
  pub page_name: String,
  pub current_page: u64,
  pub has_more: bool,
}

impl Paginated {
  pub fn new(current_page: u64, has_more: bool) -> Self {
    Self { page_name: DEFAULT_PAGE_NAME.to_string(), current_page, has_more }
  }

  pub fn page_name(mut self, name: impl Into<String>) -> Self {
    self.page_name = name.into();
    self
  }
}

struct PaginatedAdapter;

impl ScrollAdapter for PaginatedAdapter {
  fn extract(&self, paginator: &(dyn Any + Send + Sync)) -> Option<PageInfo> {
    let p = paginator.downcast_ref::<Paginated>()?;
    let previous = if p.current_page > 1 { Value::from(p.current_page - 1) } else { Value::Null };
    let next = if p.has_more { Value::from(p.current_page + 1) } else { Value::Null };
    Some(PageInfo {
      page_name: Some(p.page_name.clone()),
      previous_page: Some(previous),
      next_page: Some(next),
      current_page: Some(Value::from(p.current_page)),
    })
  }
}

/// JSON objects carrying `current_page` and optionally `next_page`,
/// `prev_page`/`previous_page` and `page_name`, as most pagination APIs
/// serialize them.
struct JsonAdapter;

impl ScrollAdapter for JsonAdapter {
  fn extract(&self, paginator: &(dyn Any + Send + Sync)) -> Option<PageInfo> {
    let obj = paginator.downcast_ref::<Value>()?.as_object()?;
    let current = obj.get("current_page").or_else(|| obj.get("currentPage"))?;
    let pick = |names: &[&str]| names.iter().find_map(|n| obj.get(*n)).cloned();
    Some(PageInfo {
      page_name: pick(&["page_name", "pageName"]).and_then(|v| v.as_str().map(String::from)),
      previous_page: Some(
        pick(&["prev_page", "previous_page", "previousPage"]).unwrap_or(Value::Null),
      ),
      next_page: Some(pick(&["next_page", "nextPage"]).unwrap_or(Value::Null)),
      current_page: Some(current.clone()),
    })
  }
}

/// How a scroll prop finds its pagination metadata.
pub struct ScrollSpec {
  paginator: Option<Arc<dyn Any + Send + Sync>>,
  literal: PageInfo,
  wrapper: String,
  match_on: Option<String>,
}

impl ScrollSpec {
  /// Metadata comes from the adapter chain.
  pub fn new<P: Any + Send + Sync>(paginator: P) -> Self {
    Self { paginator: Some(Arc::new(paginator)), ..Self::literal() }
  }

  /// No paginator; metadata comes only from the literal setters below.
  pub fn literal() -> Self {
    Self {
      paginator: None,
      literal: PageInfo::default(),
      wrapper: DEFAULT_WRAPPER.to_string(),
      match_on: None,
    }
  }

  pub fn page_name(mut self, name: impl Into<String>) -> Self {
    self.literal.page_name = Some(name.into());
    self
  }

  pub fn current_page(mut self, page: impl Into<Value>) -> Self {
    self.literal.current_page = Some(page.into());
    self
  }

  pub fn next_page(mut self, page: impl Into<Value>) -> Self {
    self.literal.next_page = Some(page.into());
    self
  }

  pub fn previous_page(mut self, page: impl Into<Value>) -> Self {
    self.literal.previous_page = Some(page.into());
    self
  }

  /// Key under the prop holding the list items. Defaults to `data`.
  pub fn wrapper(mut self, key: impl Into<String>) -> Self {
    self.wrapper = key.into();
    self
  }

  pub fn match_on(mut self, key: impl Into<String>) -> Self {
    self.match_on = Some(key.into());
    self
  }

  pub fn wrapper_key(&self) -> &str {
    &self.wrapper
  }

  pub fn match_on_key(&self) -> Option<&str> {
    self.match_on.as_deref()
  }
}

/// Adapter chain, searched front to back.
#[derive(Clone)]
pub struct ScrollAdapters {
  adapters: Vec<Arc<dyn ScrollAdapter>>,
}

impl ScrollAdapters {
  pub fn empty() -> Self {
    Self { adapters: Vec::new() }
  }

  /// Built-in adapters for [`Paginated`] and JSON pagination objects.
  pub fn with_defaults() -> Self {
    let mut chain = Self::empty();
    chain.register(Arc::new(JsonAdapter));
    chain.register(Arc::new(PaginatedAdapter));
    chain
  }

  /// Later registrations take priority over earlier ones.
  pub fn register(&mut self, adapter: Arc<dyn ScrollAdapter>) {
    self.adapters.insert(0, adapter);
  }

  pub fn len(&self) -> usize {
    self.adapters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.adapters.is_empty()
  }

  pub fn metadata(
    &self,
    prop: &str,
    spec: &ScrollSpec,
    reset: bool,
  ) -> Result<ScrollMetadata, InertiaError> {
    let extracted = spec
      .paginator
      .as_deref()
      .and_then(|p| self.adapters.iter().find_map(|a| a.extract(p)))
      .unwrap_or_default();
    let info = extracted.or(&spec.literal);

    let page_name = info
      .page_name
      .ok_or(InertiaError::MissingAdapter { prop: prop.to_string(), field: "pageName" })?;
    let current_page = info
      .current_page
      .ok_or(InertiaError::MissingAdapter { prop: prop.to_string(), field: "currentPage" })?;

    Ok(ScrollMetadata {
      page_name,
      previous_page: info.previous_page.unwrap_or(Value::Null),
      next_page: info.next_page.unwrap_or(Value::Null),
      current_page,
      reset,
    })
  }
}

impl Default for ScrollAdapters {
  fn default() -> Self {
    Self::with_defaults()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  struct Cursor {
    after: &'static str,
  }

  struct CursorAdapter;

  impl ScrollAdapter for CursorAdapter {
    fn extract(&self, paginator: &(dyn Any + Send + Sync)) -> Option<PageInfo> {
      let c = paginator.downcast_ref::<Cursor>()?;
      Some(PageInfo {
        page_name: Some("cursor".into()),
        previous_page: None,
        next_page: Some(json!(c.after)),
        current_page: Some(json!("start")),
      })
    }
  }

  /// Claims every paginator, to check priority ordering.
  struct GreedyAdapter(&'static str);

  impl ScrollAdapter for GreedyAdapter {
    fn extract(&self, _paginator: &(dyn Any + Send + Sync)) -> Option<PageInfo> {
      Some(PageInfo {
        page_name: Some(self.0.into()),
        current_page: Some(json!(1)),
        ..PageInfo::default()
      })
    }
  }

  #[test]
  fn paginated_middle_page() {
    let chain = ScrollAdapters::with_defaults();
    let meta = chain.metadata("posts", &ScrollSpec::new(Paginated::new(2, true)), false).unwrap();
    assert_eq!(meta.page_name, "page");
    assert_eq!(meta.previous_page, json!(1));
    assert_eq!(meta.next_page, json!(3));
    assert_eq!(meta.current_page, json!(2));
    assert!(!meta.reset);
  }

  #[test]
  fn paginated_first_and_last_page() {
    let chain = ScrollAdapters::with_defaults();
    let meta = chain.metadata("posts", &ScrollSpec::new(Paginated::new(1, false)), true).unwrap();
    assert_eq!(meta.previous_page, Value::Null);
    assert_eq!(meta.next_page, Value::Null);
    assert!(meta.reset);
  }

  #[test]
  fn json_paginator() {
    let chain = ScrollAdapters::with_defaults();
    let paginator = json!({"current_page": 3, "next_page": null, "prev_page": 2});
    let meta = chain.metadata("posts", &ScrollSpec::new(paginator).page_name("p"), false).unwrap();
    assert_eq!(meta.current_page, json!(3));
    assert_eq!(meta.previous_page, json!(2));
    // JSON carried no page name, so the caller's literal fills it
    assert_eq!(meta.page_name, "p");
  }

  #[test]
  fn custom_adapter_is_consulted() {
    let mut chain = ScrollAdapters::with_defaults();
    chain.register(Arc::new(CursorAdapter));
    let meta = chain.metadata("feed", &ScrollSpec::new(Cursor { after: "abc" }), false).unwrap();
    assert_eq!(meta.page_name, "cursor");
    assert_eq!(meta.next_page, json!("abc"));
    assert_eq!(meta.previous_page, Value::Null);
  }

  #[test]
  fn most_recent_registration_wins() {
    let mut chain = ScrollAdapters::empty();
    chain.register(Arc::new(GreedyAdapter("first")));
    chain.register(Arc::new(GreedyAdapter("second")));
    let meta = chain.metadata("x", &ScrollSpec::new(()), false).unwrap();
    assert_eq!(meta.page_name, "second");
  }

  #[test]
  fn literal_values_without_paginator() {
    let chain = ScrollAdapters::empty();
    let spec = ScrollSpec::literal().page_name("page").current_page(4).next_page(5);
    let meta = chain.metadata("posts", &spec, false).unwrap();
    assert_eq!(meta.current_page, json!(4));
    assert_eq!(meta.next_page, json!(5));
    assert_eq!(meta.previous_page, Value::Null);
  }

  #[test]
  fn unknown_paginator_without_literals_is_an_error() {
    let chain = ScrollAdapters::with_defaults();
    let err = chain.metadata("posts", &ScrollSpec::new(42u8), false).unwrap_err();
    assert!(matches!(err, InertiaError::MissingAdapter { field: "pageName", .. }));
  }

  #[test]
  fn missing_current_page_is_an_error() {
    let chain = ScrollAdapters::empty();
    let err = chain.metadata("posts", &ScrollSpec::literal().page_name("page"), false).unwrap_err();
    assert!(matches!(err, InertiaError::MissingAdapter { field: "currentPage", .. }));
  }

  #[test]
  fn wrapper_defaults_to_data() {
    assert_eq!(ScrollSpec::literal().wrapper_key(), "data");
    assert_eq!(ScrollSpec::literal().wrapper("items").wrapper_key(), "items");
  }
}
