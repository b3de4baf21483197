/* src/server/engine/rust/src/case.rs */

// Key-case helpers shared by the prop name transformer and head key generation.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn snake_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  // A separator followed by the character that should be upper-cased
  RE.get_or_init(|| Regex::new(r"[_\-]+([A-Za-z0-9])").expect("static regex"))
}

fn non_word_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"))
}

/// Convert `snake_case` or `kebab-case` to lower `camelCase`.
/// Leading separators are kept so private-looking keys such as `_inertia_meta`
/// keep their prefix.
pub fn camel_case(input: &str) -> String {
  let trimmed = input.trim_start_matches('_');
  let prefix = &input[..input.len() - trimmed.len()];
  let converted = snake_re().replace_all(trimmed, |caps: &Captures<'_>| caps[1].to_uppercase());
  format!("{prefix}{converted}")
}

/// Reduce a string to a lowercase, dash-separated token usable in keys.
/// `"og:title"` becomes `"og-title"`, `"Content Type"` becomes `"content-type"`.
pub fn parameterize(input: &str) -> String {
  let lower = input.to_lowercase();
  non_word_re().replace_all(&lower, "-").trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn camel_case_snake() {
    assert_eq!(camel_case("first_name"), "firstName");
    assert_eq!(camel_case("created_at_utc"), "createdAtUtc");
  }

  #[test]
  fn camel_case_kebab() {
    assert_eq!(camel_case("http-equiv"), "httpEquiv");
  }

  #[test]
  fn camel_case_already_camel() {
    assert_eq!(camel_case("firstName"), "firstName");
  }

  #[test]
  fn camel_case_keeps_leading_underscore() {
    assert_eq!(camel_case("_inertia_meta"), "_inertiaMeta");
  }

  #[test]
  fn parameterize_basic() {
    assert_eq!(parameterize("og:title"), "og-title");
    assert_eq!(parameterize("Content Type"), "content-type");
    assert_eq!(parameterize("  description "), "description");
  }
}
