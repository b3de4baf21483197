/* src/server/engine/rust/src/json.rs */

use serde_json::{Map, Value};

/// Every dot-path prefix of `path`, shortest first: `a.b.c` yields
/// `a`, `a.b`, `a.b.c`.
pub fn path_prefixes(path: &str) -> impl Iterator<Item = &str> {
  path.match_indices('.').map(|(i, _)| &path[..i]).chain(std::iter::once(path))
}

/// Join a parent path and a child key with a dot.
pub fn join_path(parent: &str, key: &str) -> String {
  if parent.is_empty() { key.to_string() } else { format!("{parent}.{key}") }
}

/// Apply `f` to every segment of a dot path.
pub fn transform_path(path: &str, f: &dyn Fn(&str) -> String) -> String {
  path.split('.').map(f).collect::<Vec<_>>().join(".")
}

/// Apply `f` to every object key, at any depth, including objects nested
/// in arrays.
pub fn transform_keys(value: Value, f: &dyn Fn(&str) -> String) -> Value {
  match value {
    Value::Object(map) => {
      let mut out = Map::with_capacity(map.len());
      for (k, v) in map {
        out.insert(f(&k), transform_keys(v, f));
      }
      Value::Object(out)
    }
    Value::Array(items) => Value::Array(items.into_iter().map(|v| transform_keys(v, f)).collect()),
    other => other,
  }
}
