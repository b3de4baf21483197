/* src/server/core/rust/src/config.rs */

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::InertiaError;
use crate::version::Version;

pub const DEFAULT_SSR_URL: &str = "http://localhost:13714";
pub const DEFAULT_ROOT_ID: &str = "app";

/// Serializable server settings. Hooks that are functions live on the
/// [`crate::InertiaServer`] builder instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertiaConfig {
  pub version: Option<Version>,
  pub ssr_enabled: bool,
  pub ssr_url: String,
  pub encrypt_history: bool,
  /// Merge shared props into action props recursively instead of by
  /// top-level key.
  pub deep_merge_shared_data: bool,
  /// HTML document with `@inertiaHead` and `@inertia` markers.
  pub root_template: Option<String>,
  pub root_id: String,
}

impl Default for InertiaConfig {
  fn default() -> Self {
    Self {
      version: None,
      ssr_enabled: false,
      ssr_url: DEFAULT_SSR_URL.to_string(),
      encrypt_history: false,
      deep_merge_shared_data: false,
      root_template: None,
      root_id: DEFAULT_ROOT_ID.to_string(),
    }
  }
}

impl InertiaConfig {
  pub fn from_json_str(json: &str) -> Result<Self, InertiaError> {
    serde_json::from_str(json).map_err(|e| InertiaError::Config(e.to_string()))
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, InertiaError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
      .map_err(|e| InertiaError::Config(format!("read {}: {e}", path.display())))?;
    Self::from_json_str(&raw)
  }

  /// Defaults overridden by `INERTIA_VERSION`, `INERTIA_SSR_ENABLED`,
  /// `INERTIA_SSR_URL` and `INERTIA_ENCRYPT_HISTORY`.
  pub fn from_env() -> Result<Self, InertiaError> {
    Self::default().with_vars(|name| std::env::var(name).ok())
  }

  fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, InertiaError> {
    if let Some(v) = var("INERTIA_VERSION") {
      self.version = Some(Version::Str(v));
    }
    if let Some(v) = var("INERTIA_SSR_ENABLED") {
      self.ssr_enabled = parse_bool("INERTIA_SSR_ENABLED", &v)?;
    }
    if let Some(v) = var("INERTIA_SSR_URL") {
      self.ssr_url = v;
    }
    if let Some(v) = var("INERTIA_ENCRYPT_HISTORY") {
      self.encrypt_history = parse_bool("INERTIA_ENCRYPT_HISTORY", &v)?;
    }
    Ok(self)
  }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, InertiaError> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" | "" => Ok(false),
    other => Err(InertiaError::Config(format!("{name}: expected a boolean, got `{other}`"))),
  }
}
