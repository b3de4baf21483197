/* src/server/adapter/axum/src/middleware.rs */

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use inertia_server::headers::LOCATION;
use inertia_server::side_channel::{self, Delivery};
use inertia_server::version::rewrite_redirect_status;
use inertia_server::{BoxFuture, InertiaEngine};

use crate::extract::{inertia_headers, request_url};
use crate::session::Session;
use crate::{Handler, MiddlewareLayer};

/// Protocol middleware: version gate, redirect status rewrite and
/// side-channel settlement. Handlers find the engine in request extensions.
#[derive(Clone)]
pub struct InertiaLayer {
  engine: Arc<InertiaEngine>,
}

impl InertiaLayer {
  pub fn new(engine: Arc<InertiaEngine>) -> Self {
    Self { engine }
  }

  pub fn engine(&self) -> &Arc<InertiaEngine> {
    &self.engine
  }

  pub fn middleware(&self) -> MiddlewareLayer<InertiaLayer> {
    axum::middleware::from_fn_with_state(self.clone(), inertia_handler as Handler<InertiaLayer>)
  }

  async fn handle(self, mut req: Request, next: Next) -> Response {
    let headers = inertia_headers(req.headers());
    let method = req.method().as_str().to_string();

    if self.engine.is_stale(&method, &headers) {
      let url = request_url(req.uri());
      tracing::debug!(%url, sent = ?headers.version, "stale asset version, forcing reload");
      // errors and flash stay in the session for the reloaded page
      return location_response(&url);
    }

    let session = req.extensions().get::<Session>().cloned();
    req.extensions_mut().insert(self.engine.clone());
    let mut response = next.run(req).await;

    if headers.inertia {
      let rewritten = rewrite_redirect_status(&method, response.status().as_u16());
      if let Ok(status) = StatusCode::from_u16(rewritten) {
        *response.status_mut() = status;
      }
    }

    if let Some(Session(store)) = session {
      let delivery = if response.headers().contains_key(LOCATION) {
        Delivery::Redirect
      } else {
        Delivery::from_status(response.status().as_u16(), false)
      };
      side_channel::settle(store.as_ref(), delivery);
    }
    response
  }
}

fn inertia_handler(
  State(layer): State<InertiaLayer>,
  req: Request,
  next: Next,
) -> BoxFuture<Response> {
  Box::pin(layer.handle(req, next))
}

/// `409 Conflict` with `X-Inertia-Location`: the client does a full visit.
pub(crate) fn location_response(url: &str) -> Response {
  let mut response = StatusCode::CONFLICT.into_response();
  match HeaderValue::from_str(url) {
    Ok(value) => {
      response.headers_mut().insert(HeaderName::from_static(LOCATION), value);
    }
    Err(e) => tracing::warn!(%url, error = %e, "location is not a valid header value"),
  }
  response
}
