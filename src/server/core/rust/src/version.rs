/* src/server/core/rust/src/version.rs */

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Asset version. A numeric version makes the gate compare numerically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Version {
  Num(f64),
  Str(String),
}

impl Version {
  /// Wire form for `page.version`; integral numbers serialize without a
  /// fractional part.
  pub fn to_value(&self) -> Value {
    match self {
      Self::Num(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Value::from(*n as i64),
      Self::Num(n) => Value::from(*n),
      Self::Str(s) => Value::from(s.as_str()),
    }
  }
}

impl From<&str> for Version {
  fn from(s: &str) -> Self {
    Self::Str(s.to_string())
  }
}

impl From<String> for Version {
  fn from(s: String) -> Self {
    Self::Str(s)
  }
}

impl From<f64> for Version {
  fn from(n: f64) -> Self {
    Self::Num(n)
  }
}

impl From<i64> for Version {
  fn from(n: i64) -> Self {
    Self::Num(n as f64)
  }
}

/// Whether the client's `X-Inertia-Version` disagrees with the server's.
///
/// No configured version never goes stale. A missing header against a
/// configured version is stale. Numeric versions parse the header as a
/// number and an unparseable header is stale.
pub fn is_stale(configured: Option<&Version>, sent: Option<&str>) -> bool {
  let Some(configured) = configured else {
    return false;
  };
  let Some(sent) = sent.map(str::trim) else {
    return true;
  };
  match configured {
    Version::Num(n) => !sent.parse::<f64>().is_ok_and(|s| s == *n),
    Version::Str(s) => s != sent,
  }
}

/// 301/302 answers to PUT, PATCH and DELETE become 303 so the client
/// follows them with a GET.
pub fn rewrite_redirect_status(method: &str, status: u16) -> u16 {
  let mutating = matches!(method.to_ascii_uppercase().as_str(), "PUT" | "PATCH" | "DELETE");
  if mutating && matches!(status, 301 | 302) { 303 } else { status }
}
