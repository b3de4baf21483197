/* src/server/core/rust/src/props.rs */

use crate::prop::Prop;

/// Ordered `key -> Prop` collection. Inserting an existing key replaces the
/// prop in place, so the first registration decides the position.
#[derive(Clone, Default, Debug)]
pub struct Props {
  entries: Vec<(String, Prop)>,
}

impl Props {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insert.
  pub fn with(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
    self.insert(key, prop);
    self
  }

  pub fn insert(&mut self, key: impl Into<String>, prop: impl Into<Prop>) -> &mut Self {
    let key = key.into();
    let prop = prop.into();
    if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
      slot.1 = prop;
    } else {
      self.entries.push((key, prop));
    }
    self
  }

  pub fn get(&self, key: &str) -> Option<&Prop> {
    self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
  }

  pub fn remove(&mut self, key: &str) -> Option<Prop> {
    let idx = self.entries.iter().position(|(k, _)| k == key)?;
    Some(self.entries.remove(idx).1)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.entries.iter().any(|(k, _)| k == key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop)> {
    self.entries.iter().map(|(k, p)| (k.as_str(), p))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Layer `other` on top: its keys replace ours.
  pub fn merge(&mut self, other: Props) {
    for (key, prop) in other.entries {
      self.insert(key, prop);
    }
  }

  /// Layer `other` on top, recursing where both sides are containers.
  pub fn deep_merge(&mut self, other: Props) {
    for (key, prop) in other.entries {
      let merged = match (self.get(&key).and_then(Prop::children), prop.children()) {
        (Some(mut ours), Some(theirs)) => {
          ours.deep_merge(theirs);
          Prop::object(ours)
        }
        _ => prop,
      };
      self.insert(key, merged);
    }
  }
}

impl FromIterator<(String, Prop)> for Props {
  fn from_iter<I: IntoIterator<Item = (String, Prop)>>(iter: I) -> Self {
    let mut props = Props::new();
    for (k, p) in iter {
      props.insert(k, p);
    }
    props
  }
}

impl From<serde_json::Map<String, serde_json::Value>> for Props {
  fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
    map.into_iter().map(|(k, v)| (k, Prop::value(v))).collect()
  }
}
