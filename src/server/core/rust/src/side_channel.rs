/* src/server/core/rust/src/side_channel.rs */

//! Session-backed payloads that survive exactly one redirect.
//!
//! Errors and flash written before a redirect are read by the next render
//! and removed once a response is actually delivered. Redirects and forced
//! reloads (409) do not count as delivery.

use serde_json::{Map, Value};

use crate::context::SessionStore;
use crate::notify::Notifier;

pub const ERRORS_KEY: &str = "inertia_errors";
pub const FLASH_KEY: &str = "inertia_flash";
pub const CLEAR_HISTORY_KEY: &str = "inertia_clear_history";

/// How the response to the current request left the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  /// A page or other final response reached the client.
  Delivered,
  /// The response sends the client elsewhere.
  Redirect,
  /// Version mismatch; the client reloads and asks again.
  Stale,
}

impl Delivery {
  /// Classify by response status and whether the version gate fired.
  pub fn from_status(status: u16, stale: bool) -> Self {
    if stale {
      Self::Stale
    } else if (300..400).contains(&status) {
      Self::Redirect
    } else {
      Self::Delivered
    }
  }
}

/// Non-object payloads are a legacy shape: wrap them under `base`.
fn coerce_errors(errors: Value, notifier: &dyn Notifier) -> Map<String, Value> {
  match errors {
    Value::Object(map) => map,
    Value::Null => Map::new(),
    other => {
      notifier.deprecated("non-object validation errors; pass an object keyed by field");
      let mut map = Map::new();
      map.insert("base".to_string(), other);
      map
    }
  }
}

/// Store validation errors for the next render.
pub fn put_errors(session: &dyn SessionStore, errors: Value, notifier: &dyn Notifier) {
  let errors = coerce_errors(errors, notifier);
  session.set(ERRORS_KEY, Value::Object(errors));
}

/// Store flash data for the next render. Keys merge with flash already
/// pending.
pub fn put_flash(session: &dyn SessionStore, flash: Map<String, Value>) {
  let mut pending = match session.get(FLASH_KEY) {
    Some(Value::Object(map)) => map,
    _ => Map::new(),
  };
  pending.extend(flash);
  session.set(FLASH_KEY, Value::Object(pending));
}

/// Ask the client to clear its history state on the next page.
pub fn request_clear_history(session: &dyn SessionStore) {
  session.set(CLEAR_HISTORY_KEY, Value::Bool(true));
}

/// Pending errors, left in place until [`settle`].
pub fn errors(session: &dyn SessionStore, notifier: &dyn Notifier) -> Map<String, Value> {
  session.get(ERRORS_KEY).map(|v| coerce_errors(v, notifier)).unwrap_or_default()
}

/// Pending flash, left in place until [`settle`].
pub fn flash(session: &dyn SessionStore) -> Option<Map<String, Value>> {
  match session.get(FLASH_KEY) {
    Some(Value::Object(map)) if !map.is_empty() => Some(map),
    _ => None,
  }
}

/// Consume the clear-history flag.
pub fn take_clear_history(session: &dyn SessionStore) -> bool {
  matches!(session.remove(CLEAR_HISTORY_KEY), Some(Value::Bool(true)))
}

/// Drop errors and flash once they have been delivered.
pub fn settle(session: &dyn SessionStore, delivery: Delivery) {
  if delivery == Delivery::Delivered {
    session.remove(ERRORS_KEY);
    session.remove(FLASH_KEY);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::context::MemorySession;
  use crate::notify::LogNotifier;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Default)]
  struct Counting(AtomicUsize);

  impl Notifier for Counting {
    fn unoptimized_partial_render(&self, _component: &str, _paths: &[String]) {}

    fn deprecated(&self, _message: &str) {
      self.0.fetch_add(1, Ordering::SeqCst);
    }
  }

  #[test]
  fn survives_redirect_and_stale_then_delivered_once() {
    let session = MemorySession::new();
    put_errors(&session, json!({"email": "is invalid"}), &LogNotifier);
    put_flash(&session, json!({"notice": "saved"}).as_object().cloned().unwrap());

    settle(&session, Delivery::Redirect);
    settle(&session, Delivery::Stale);
    let expected = json!({"email": "is invalid"}).as_object().cloned().unwrap();
    assert_eq!(errors(&session, &LogNotifier), expected);
    assert_eq!(flash(&session), json!({"notice": "saved"}).as_object().cloned());

    settle(&session, Delivery::Delivered);
    assert!(errors(&session, &LogNotifier).is_empty());
    assert!(flash(&session).is_none());
    assert!(session.is_empty());
  }

  #[test]
  fn non_object_errors_are_coerced_with_warning() {
    let session = MemorySession::new();
    let notifier = Counting::default();
    put_errors(&session, json!("something went wrong"), &notifier);
    assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    assert_eq!(session.get(ERRORS_KEY), Some(json!({"base": "something went wrong"})));
  }

  #[test]
  fn flash_merges_pending_keys() {
    let session = MemorySession::new();
    put_flash(&session, json!({"a": 1}).as_object().cloned().unwrap());
    put_flash(&session, json!({"b": 2}).as_object().cloned().unwrap());
    assert_eq!(flash(&session), json!({"a": 1, "b": 2}).as_object().cloned());
  }

  #[test]
  fn clear_history_is_one_shot() {
    let session = MemorySession::new();
    assert!(!take_clear_history(&session));
    request_clear_history(&session);
    assert!(take_clear_history(&session));
    assert!(!take_clear_history(&session));
  }

  #[test]
  fn delivery_from_status() {
    assert_eq!(Delivery::from_status(200, false), Delivery::Delivered);
    assert_eq!(Delivery::from_status(302, false), Delivery::Redirect);
    assert_eq!(Delivery::from_status(303, false), Delivery::Redirect);
    assert_eq!(Delivery::from_status(409, true), Delivery::Stale);
    assert_eq!(Delivery::from_status(422, false), Delivery::Delivered);
  }
}
