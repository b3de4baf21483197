/* src/server/engine/rust/src/page.rs */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::escape::escape_html;

/// Marker replaced by head tags (SSR head or rendered meta tags).
pub const HEAD_MARKER: &str = "@inertiaHead";
/// Marker replaced by the root element carrying the page payload.
pub const ROOT_MARKER: &str = "@inertia";

/// Minimal document used when the host does not configure a root template.
pub const DEFAULT_SHELL: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">@inertiaHead</head>\
  <body>@inertia</body></html>";

/// Pagination metadata for a scroll prop, emitted under `scrollProps[key]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetadata {
  pub page_name: String,
  pub previous_page: serde_json::Value,
  pub next_page: serde_json::Value,
  pub current_page: serde_json::Value,
  pub reset: bool,
}

/// The page object sent to the client, either as the JSON body of a protocol
/// request or embedded in the root element of a full document.
///
/// Merge manifests, deferred groups, scroll metadata and flash are omitted
/// from the wire when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
  pub component: String,
  pub props: serde_json::Map<String, serde_json::Value>,
  pub url: String,
  pub version: serde_json::Value,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub merge_props: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub prepend_props: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub deep_merge_props: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub match_props_on: Vec<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub deferred_props: BTreeMap<String, Vec<String>>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub scroll_props: BTreeMap<String, ScrollMetadata>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub flash: Option<serde_json::Map<String, serde_json::Value>>,
  pub encrypt_history: bool,
  pub clear_history: bool,
}

impl Page {
  pub fn new(component: impl Into<String>, url: impl Into<String>) -> Self {
    Self {
      component: component.into(),
      props: serde_json::Map::new(),
      url: url.into(),
      version: serde_json::Value::Null,
      merge_props: Vec::new(),
      prepend_props: Vec::new(),
      deep_merge_props: Vec::new(),
      match_props_on: Vec::new(),
      deferred_props: BTreeMap::new(),
      scroll_props: BTreeMap::new(),
      flash: None,
      encrypt_history: false,
      clear_history: false,
    }
  }
}

/// Build the root element carrying the serialized page in `data-page`.
pub fn page_root_element(root_id: &str, page_json: &str) -> String {
  format!(r#"<div id="{}" data-page="{}"></div>"#, escape_html(root_id), escape_html(page_json))
}

/// Place the root element (or SSR body) into the document.
/// Uses the `@inertia` marker when present, otherwise inserts before `</body>`.
pub fn inject_page_root(html: &str, body: &str) -> String {
  if let Some(pos) = find_root_marker(html) {
    let mut result = String::with_capacity(html.len() + body.len());
    result.push_str(&html[..pos]);
    result.push_str(body);
    result.push_str(&html[pos + ROOT_MARKER.len()..]);
    return result;
  }
  if let Some(pos) = html.rfind("</body>") {
    let mut result = String::with_capacity(html.len() + body.len());
    result.push_str(&html[..pos]);
    result.push_str(body);
    result.push_str(&html[pos..]);
    result
  } else {
    format!("{html}{body}")
  }
}

/// Place head markup into the document.
/// Uses the `@inertiaHead` marker when present, otherwise inserts after
/// `<meta charset="utf-8">`, otherwise leaves the document unchanged.
pub fn inject_head(html: &str, head: &str) -> String {
  if html.contains(HEAD_MARKER) {
    return html.replacen(HEAD_MARKER, head, 1);
  }
  let charset = r#"<meta charset="utf-8">"#;
  if let Some(pos) = html.find(charset) {
    let insert_at = pos + charset.len();
    let mut result = String::with_capacity(html.len() + head.len());
    result.push_str(&html[..insert_at]);
    result.push_str(head);
    result.push_str(&html[insert_at..]);
    result
  } else {
    html.to_string()
  }
}

/// Find `@inertia` that is not the start of `@inertiaHead`.
fn find_root_marker(html: &str) -> Option<usize> {
  let mut offset = 0;
  while let Some(found) = html[offset..].find(ROOT_MARKER) {
    let pos = offset + found;
    if !html[pos..].starts_with(HEAD_MARKER) {
      return Some(pos);
    }
    offset = pos + HEAD_MARKER.len();
  }
  None
}
