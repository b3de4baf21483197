/* src/server/engine/rust/src/meta.rs */

//! Head tag descriptors and their deduplicating assembler.
//!
//! Every tag has a head key. Tags sharing a key replace each other, so two
//! independent registration points describing the same tag (a controller and
//! a shared module, say) end up contributing one tag without coordinating.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use sha2::{Digest, Sha256};

use crate::case::parameterize;
use crate::escape::{escape_html, escape_script_content};

/// Attributes that identify a `<meta>` tag, checked in this order.
const IDENTIFYING_META_ATTRS: [&str; 3] = ["name", "property", "http-equiv"];

/// Elements rendered without a closing tag.
const VOID_ELEMENTS: [&str; 3] = ["meta", "link", "base"];

#[derive(Debug, Clone, PartialEq)]
pub struct MetaTag {
  tag_name: String,
  head_key: Option<String>,
  allow_duplicates: bool,
  raw_allowed: bool,
  attributes: BTreeMap<String, String>,
  inner_content: Option<String>,
}

impl MetaTag {
  pub fn new(tag_name: impl Into<String>) -> Self {
    Self {
      tag_name: tag_name.into(),
      head_key: None,
      allow_duplicates: false,
      raw_allowed: false,
      attributes: BTreeMap::new(),
      inner_content: None,
    }
  }

  pub fn title(text: impl Into<String>) -> Self {
    Self::new("title").content(text)
  }

  /// `<meta name="..." content="...">`
  pub fn name(name: impl Into<String>, content: impl Into<String>) -> Self {
    Self::new("meta").attr("name", name).attr("content", content)
  }

  /// `<meta property="..." content="...">`, used by Open Graph tags.
  pub fn property(property: impl Into<String>, content: impl Into<String>) -> Self {
    Self::new("meta").attr("property", property).attr("content", content)
  }

  /// `<script type="application/ld+json">` with raw JSON content.
  pub fn json_ld(value: &serde_json::Value) -> Self {
    Self::new("script").attr("type", "application/ld+json").content(value.to_string()).raw()
  }

  pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }

  pub fn content(mut self, inner: impl Into<String>) -> Self {
    self.inner_content = Some(inner.into());
    self
  }

  pub fn head_key(mut self, key: impl Into<String>) -> Self {
    self.head_key = Some(key.into());
    self
  }

  /// Keep this tag alongside others with the same identifying attribute by
  /// suffixing the generated key with a digest of its content.
  pub fn allow_duplicates(mut self) -> Self {
    self.allow_duplicates = true;
    self
  }

  /// Emit inner content without HTML escaping (script bodies, JSON-LD).
  pub fn raw(mut self) -> Self {
    self.raw_allowed = true;
    self
  }

  pub fn tag_name(&self) -> &str {
    &self.tag_name
  }

  pub fn attributes(&self) -> &BTreeMap<String, String> {
    &self.attributes
  }

  pub fn inner_content(&self) -> Option<&str> {
    self.inner_content.as_deref()
  }

  pub fn raw_allowed(&self) -> bool {
    self.raw_allowed
  }

  /// The explicit head key, or one derived from the tag's content.
  pub fn key(&self) -> String {
    match self.head_key {
      Some(ref key) => key.clone(),
      None => self.generate_key(),
    }
  }

  fn generate_key(&self) -> String {
    if self.tag_name == "title" {
      return "title".to_string();
    }
    if self.tag_name == "meta" {
      let identifying = IDENTIFYING_META_ATTRS
        .iter()
        .find_map(|attr| self.attributes.get(*attr).map(|value| (*attr, value)));
      if let Some((attr, value)) = identifying {
        let base = format!("meta-{}-{}", parameterize(attr), parameterize(value));
        if self.allow_duplicates {
          let content = self.attributes.get("content").map(String::as_str).unwrap_or("");
          return format!("{base}-{}", short_digest(&[content]));
        }
        return base;
      }
    }
    format!("{}-{}", self.tag_name, self.signature_digest())
  }

  /// Digest over the sorted attribute set and inner content.
  fn signature_digest(&self) -> String {
    let mut parts: Vec<String> =
      self.attributes.iter().map(|(k, v)| format!("{k}={v}")).collect();
    if let Some(ref inner) = self.inner_content {
      parts.push(format!("#{inner}"));
    }
    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    short_digest(&refs)
  }

  /// Render as HTML with an `inertia` attribute carrying the head key so the
  /// client can take ownership of server-rendered tags.
  pub fn to_html(&self) -> String {
    let mut html = format!("<{}", self.tag_name);
    for (k, v) in &self.attributes {
      html.push_str(&format!(r#" {}="{}""#, k, escape_html(v)));
    }
    html.push_str(&format!(r#" inertia="{}">"#, escape_html(&self.key())));

    if VOID_ELEMENTS.contains(&self.tag_name.as_str()) {
      return html;
    }
    if let Some(ref inner) = self.inner_content {
      if self.raw_allowed {
        html.push_str(&escape_script_content(inner));
      } else {
        html.push_str(&escape_html(inner));
      }
    }
    html.push_str(&format!("</{}>", self.tag_name));
    html
  }
}

impl Serialize for MetaTag {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let extra = 2 + usize::from(self.inner_content.is_some());
    let mut map = serializer.serialize_map(Some(self.attributes.len() + extra))?;
    map.serialize_entry("tagName", &self.tag_name)?;
    map.serialize_entry("headKey", &self.key())?;
    for (k, v) in &self.attributes {
      map.serialize_entry(k, v)?;
    }
    if let Some(ref inner) = self.inner_content {
      map.serialize_entry("innerContent", inner)?;
    }
    map.end()
  }
}

/// First 4 bytes of a SHA-256 over the joined parts, as 8 hex chars.
fn short_digest(parts: &[&str]) -> String {
  let mut hasher = Sha256::new();
  for part in parts {
    hasher.update(part.as_bytes());
    hasher.update([0u8]);
  }
  let result = hasher.finalize();
  hex::encode(&result[..4])
}

/// Ordered, head-key-deduplicated collection of tags.
/// A tag whose key already exists replaces the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaTags {
  tags: Vec<(String, MetaTag)>,
}

impl MetaTags {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, tag: MetaTag) -> &mut Self {
    let key = tag.key();
    if let Some(slot) = self.tags.iter_mut().find(|(k, _)| *k == key) {
      slot.1 = tag;
    } else {
      self.tags.push((key, tag));
    }
    self
  }

  pub fn add_all(&mut self, tags: impl IntoIterator<Item = MetaTag>) -> &mut Self {
    for tag in tags {
      self.add(tag);
    }
    self
  }

  /// Append another set in order; its tags win over ours on key collisions.
  pub fn merge(&mut self, other: MetaTags) -> &mut Self {
    for (_, tag) in other.tags {
      self.add(tag);
    }
    self
  }

  pub fn remove(&mut self, head_key: &str) -> Option<MetaTag> {
    let idx = self.tags.iter().position(|(k, _)| k == head_key)?;
    Some(self.tags.remove(idx).1)
  }

  /// Remove every tag matching the predicate, returning how many were dropped.
  pub fn remove_where(&mut self, predicate: impl Fn(&MetaTag) -> bool) -> usize {
    let before = self.tags.len();
    self.tags.retain(|(_, tag)| !predicate(tag));
    before - self.tags.len()
  }

  pub fn get(&self, head_key: &str) -> Option<&MetaTag> {
    self.tags.iter().find(|(k, _)| k == head_key).map(|(_, t)| t)
  }

  pub fn iter(&self) -> impl Iterator<Item = &MetaTag> {
    self.tags.iter().map(|(_, t)| t)
  }

  pub fn len(&self) -> usize {
    self.tags.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tags.is_empty()
  }

  pub fn to_html(&self) -> String {
    self.iter().map(MetaTag::to_html).collect::<Vec<_>>().join("")
  }

  pub fn to_value(&self) -> serde_json::Value {
    serde_json::Value::Array(
      self.iter().filter_map(|t| serde_json::to_value(t).ok()).collect(),
    )
  }
}
