/* src/server/adapter/axum/src/session.rs */

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use inertia_server::{BoxFuture, MemorySession, SessionStore};
use rand::Rng;

use crate::{Handler, MiddlewareLayer};

pub const SESSION_COOKIE: &str = "inertia_session";

/// The session store for the current request, placed in request
/// extensions. Hosts with their own session system insert this themselves.
#[derive(Clone)]
pub struct Session(pub Arc<dyn SessionStore>);

/// Cookie-keyed in-memory sessions. Suitable for development and tests;
/// state is lost on restart and not shared between processes.
///
/// A session is only kept (and its cookie set) once a request leaves
/// something in it. Idle sessions expire, and the oldest one is evicted when
/// the store is full.
#[derive(Clone)]
pub struct MemorySessions {
  sessions: Arc<DashMap<String, Entry>>,
  idle_timeout: Duration,
  capacity: usize,
}

struct Entry {
  session: Arc<MemorySession>,
  seen: Instant,
}

impl Default for MemorySessions {
  fn default() -> Self {
    Self {
      sessions: Arc::new(DashMap::new()),
      idle_timeout: Duration::from_secs(2 * 60 * 60),
      capacity: 10_000,
    }
  }
}

impl MemorySessions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drop sessions not seen for `timeout`. Defaults to two hours.
  pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
    self.idle_timeout = timeout;
    self
  }

  /// Keep at most `capacity` sessions. Defaults to 10 000.
  pub fn with_capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity.max(1);
    self
  }

  pub fn len(&self) -> usize {
    self.sessions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.is_empty()
  }

  /// Layer this outside the Inertia layer so sessions exist before it runs.
  pub fn middleware(&self) -> MiddlewareLayer<MemorySessions> {
    axum::middleware::from_fn_with_state(self.clone(), session_handler as Handler<MemorySessions>)
  }

  fn lookup(&self, req: &Request) -> Option<Arc<MemorySession>> {
    let id = cookie_value(req, SESSION_COOKIE)?;
    let mut entry = self.sessions.get_mut(&id)?;
    if entry.seen.elapsed() >= self.idle_timeout {
      drop(entry);
      self.sessions.remove(&id);
      tracing::debug!("session expired");
      return None;
    }
    entry.seen = Instant::now();
    Some(entry.session.clone())
  }

  fn store(&self, id: String, session: Arc<MemorySession>) {
    let now = Instant::now();
    self.sessions.retain(|_, entry| now.duration_since(entry.seen) < self.idle_timeout);
    while self.sessions.len() >= self.capacity {
      let oldest = self
        .sessions
        .iter()
        .min_by_key(|entry| entry.seen)
        .map(|entry| entry.key().clone());
      match oldest {
        Some(key) => {
          self.sessions.remove(&key);
        }
        None => break,
      }
    }
    self.sessions.insert(id, Entry { session, seen: now });
  }

  async fn handle(self, mut req: Request, next: Next) -> Response {
    if let Some(session) = self.lookup(&req) {
      req.extensions_mut().insert(Session(session));
      return next.run(req).await;
    }

    let session = Arc::new(MemorySession::new());
    req.extensions_mut().insert(Session(session.clone()));
    let mut response = next.run(req).await;
    if session.is_empty() {
      return response;
    }

    let bytes: [u8; 16] = rand::thread_rng().r#gen();
    let id = hex::encode(bytes);
    let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    match HeaderValue::from_str(&cookie) {
      Ok(value) => {
        response.headers_mut().append(SET_COOKIE, value);
        self.store(id, session);
      }
      Err(e) => tracing::error!(error = %e, "invalid session cookie"),
    }
    response
  }
}

fn session_handler(
  State(sessions): State<MemorySessions>,
  req: Request,
  next: Next,
) -> BoxFuture<Response> {
  Box::pin(sessions.handle(req, next))
}

fn cookie_value(req: &Request, name: &str) -> Option<String> {
  req
    .headers()
    .get_all(COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .find_map(|pair| {
      let (k, v) = pair.trim().split_once('=')?;
      (k == name).then(|| v.to_string())
    })
}
