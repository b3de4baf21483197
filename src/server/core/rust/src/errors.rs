/* src/server/core/rust/src/errors.rs */

use thiserror::Error;

/// Errors raised by the protocol core.
///
/// Configuration mistakes (`UnknownAction`, `ConflictingMerge`,
/// `MissingAdapter`, `RegistryFrozen`) are fatal to the request that hits
/// them. Runtime failures carry the message of whatever produced them.
#[derive(Debug, Error)]
pub enum InertiaError {
  #[error("filter names action `{action}` which scope `{scope}` does not define")]
  UnknownAction { scope: String, action: String },

  #[error("prop `{0}` cannot be both merge and deep merge")]
  ConflictingMerge(String),

  #[error("no scroll metadata adapter matched prop `{prop}` and `{field}` was not supplied")]
  MissingAdapter { prop: String, field: &'static str },

  #[error("scope `{0}` is frozen; register shared props before serving requests")]
  RegistryFrozen(String),

  #[error("prop `{key}` failed: {message}")]
  Prop { key: String, message: String },

  #[error("serialization failed: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("SSR request failed: {0}")]
  Ssr(String),

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("{0}")]
  Internal(String),
}

impl InertiaError {
  /// Convenience for prop thunks reporting their own failure.
  pub fn prop(key: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Prop { key: key.into(), message: message.into() }
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self::Internal(message.into())
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::UnknownAction { .. } => "UNKNOWN_ACTION",
      Self::ConflictingMerge(_) => "CONFLICTING_MERGE",
      Self::MissingAdapter { .. } => "MISSING_ADAPTER",
      Self::RegistryFrozen(_) => "REGISTRY_FROZEN",
      Self::Prop { .. } => "PROP_ERROR",
      Self::Serialize(_) => "SERIALIZE_ERROR",
      Self::Ssr(_) => "SSR_ERROR",
      Self::Config(_) => "CONFIG_ERROR",
      Self::Internal(_) => "INTERNAL_ERROR",
    }
  }

  /// HTTP status the adapter should answer with.
  /// Every variant is a server-side fault, so all map to 500 except SSR
  /// failures, which callers normally recover from before they surface.
  pub fn status(&self) -> u16 {
    match self {
      Self::Ssr(_) => 502,
      _ => 500,
    }
  }

  /// True for mistakes in how props, filters or adapters were registered.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      Self::UnknownAction { .. }
        | Self::ConflictingMerge(_)
        | Self::MissingAdapter { .. }
        | Self::RegistryFrozen(_)
        | Self::Config(_)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_are_stable() {
    assert_eq!(InertiaError::ConflictingMerge("a".into()).code(), "CONFLICTING_MERGE");
    assert_eq!(InertiaError::prop("a", "boom").code(), "PROP_ERROR");
    assert_eq!(InertiaError::internal("x").code(), "INTERNAL_ERROR");
  }

  #[test]
  fn statuses() {
    assert_eq!(InertiaError::Ssr("down".into()).status(), 502);
    assert_eq!(InertiaError::RegistryFrozen("users".into()).status(), 500);
  }

  #[test]
  fn configuration_classification() {
    let unknown = InertiaError::UnknownAction { scope: "users".into(), action: "nope".into() };
    assert!(unknown.is_configuration());
    assert!(!InertiaError::prop("k", "m").is_configuration());
  }

  #[test]
  fn display_format() {
    let err = InertiaError::MissingAdapter { prop: "posts".into(), field: "currentPage" };
    assert_eq!(
      err.to_string(),
      "no scroll metadata adapter matched prop `posts` and `currentPage` was not supplied"
    );
    let err = InertiaError::UnknownAction { scope: "users".into(), action: "nope".into() };
    assert_eq!(err.to_string(), "filter names action `nope` which scope `users` does not define");
  }
}
