/* src/server/core/rust/src/headers.rs */

// Protocol header names (lowercase, as HTTP/2 transmits them) and the parsed
// view of an inbound request's protocol headers.

pub const INERTIA: &str = "x-inertia";
pub const VERSION: &str = "x-inertia-version";
pub const LOCATION: &str = "x-inertia-location";
pub const PARTIAL_DATA: &str = "x-inertia-partial-data";
pub const PARTIAL_EXCEPT: &str = "x-inertia-partial-except";
pub const PARTIAL_COMPONENT: &str = "x-inertia-partial-component";
pub const RESET: &str = "x-inertia-reset";
pub const ERROR_BAG: &str = "x-inertia-error-bag";
pub const MERGE_INTENT: &str = "x-inertia-infinite-scroll-merge-intent";

/// Direction a scroll prop's new page should be merged in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeIntent {
  #[default]
  Append,
  Prepend,
}

impl MergeIntent {
  /// Case-sensitive: only the exact value `prepend` flips the direction.
  pub fn parse(value: &str) -> Self {
    if value.trim() == "prepend" { Self::Prepend } else { Self::Append }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InertiaHeaders {
  pub inertia: bool,
  pub version: Option<String>,
  pub partial_component: Option<String>,
  pub partial_data: Vec<String>,
  pub partial_except: Vec<String>,
  pub reset: Vec<String>,
  pub error_bag: Option<String>,
  pub merge_intent: MergeIntent,
}

impl InertiaHeaders {
  /// Parse from `(name, value)` pairs. Names are matched case-insensitively;
  /// unknown headers are ignored.
  pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
    let mut parsed = Self::default();
    for (name, value) in pairs {
      let name = name.to_ascii_lowercase();
      match name.as_str() {
        INERTIA => parsed.inertia = true,
        VERSION => parsed.version = non_empty(value),
        PARTIAL_COMPONENT => parsed.partial_component = non_empty(value),
        PARTIAL_DATA => parsed.partial_data = parse_list(value),
        PARTIAL_EXCEPT => parsed.partial_except = parse_list(value),
        RESET => parsed.reset = parse_list(value),
        ERROR_BAG => parsed.error_bag = non_empty(value),
        MERGE_INTENT => parsed.merge_intent = MergeIntent::parse(value),
        _ => {}
      }
    }
    parsed
  }
}

fn non_empty(value: &str) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Split a comma-separated header value, dropping blank segments.
/// Malformed input degrades to whatever entries survive.
pub fn parse_list(value: &str) -> Vec<String> {
  value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_full_partial_request() {
    let headers = InertiaHeaders::from_pairs([
      ("X-Inertia", "true"),
      ("X-Inertia-Version", "abc123"),
      ("X-Inertia-Partial-Component", "Users/Index"),
      ("X-Inertia-Partial-Data", "users, auth.user"),
      ("X-Inertia-Partial-Except", "stats"),
      ("X-Inertia-Reset", "posts"),
      ("X-Inertia-Error-Bag", "login"),
    ]);
    assert!(headers.inertia);
    assert_eq!(headers.version.as_deref(), Some("abc123"));
    assert_eq!(headers.partial_component.as_deref(), Some("Users/Index"));
    assert_eq!(headers.partial_data, vec!["users", "auth.user"]);
    assert_eq!(headers.partial_except, vec!["stats"]);
    assert_eq!(headers.reset, vec!["posts"]);
    assert_eq!(headers.error_bag.as_deref(), Some("login"));
  }

  #[test]
  fn plain_request_is_not_inertia() {
    let headers = InertiaHeaders::from_pairs([("accept", "text/html")]);
    assert!(!headers.inertia);
    assert_eq!(headers, InertiaHeaders::default());
  }

  #[test]
  fn malformed_lists_degrade() {
    assert_eq!(parse_list(" , ,a,,b , "), vec!["a", "b"]);
    assert!(parse_list("").is_empty());
  }

  #[test]
  fn merge_intent_is_case_sensitive() {
    assert_eq!(MergeIntent::parse("prepend"), MergeIntent::Prepend);
    assert_eq!(MergeIntent::parse("Prepend"), MergeIntent::Append);
    assert_eq!(MergeIntent::parse("append"), MergeIntent::Append);
    assert_eq!(MergeIntent::parse("sideways"), MergeIntent::Append);
  }

  #[test]
  fn blank_version_is_none() {
    let headers = InertiaHeaders::from_pairs([("x-inertia-version", "  ")]);
    assert_eq!(headers.version, None);
  }
}
