/* src/server/adapter/axum/src/lib.rs */

mod error;
mod extract;
mod middleware;
mod session;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::{FromFnLayer, Next};
use axum::response::Response;
use inertia_server::{BoxFuture, InertiaEngine};

/// Re-export the protocol core for convenience
pub use inertia_server;

pub use error::AxumError;
pub use extract::Inertia;
pub use middleware::InertiaLayer;
pub use session::{MemorySessions, SESSION_COOKIE, Session};

pub type Handler<S> = fn(State<S>, Request, Next) -> BoxFuture<Response>;

/// Layer type produced by the adapter's `middleware()` constructors.
pub type MiddlewareLayer<S> = FromFnLayer<Handler<S>, S, (State<S>, Request)>;

/// Extension trait that wires the Inertia middleware into an Axum router.
pub trait InertiaRouterExt {
  /// Install the protocol layer with in-memory sessions outside it.
  fn with_inertia(self, engine: Arc<InertiaEngine>, sessions: &MemorySessions) -> Self;
}

impl<S> InertiaRouterExt for axum::Router<S>
where
  S: Clone + Send + Sync + 'static,
{
  fn with_inertia(self, engine: Arc<InertiaEngine>, sessions: &MemorySessions) -> Self {
    self.layer(InertiaLayer::new(engine).middleware()).layer(sessions.middleware())
  }
}

/// Bind `addr` and serve `router` until the process stops.
pub async fn serve(router: axum::Router, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
  let listener = tokio::net::TcpListener::bind(addr).await?;
  let local_addr = listener.local_addr()?;
  tracing::info!(port = local_addr.port(), "inertia server listening");
  axum::serve(listener, router).await?;
  Ok(())
}
