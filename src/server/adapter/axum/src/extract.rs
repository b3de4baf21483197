/* src/server/adapter/axum/src/extract.rs */

use std::any::Any;
use std::sync::Arc;

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::header::{LOCATION, VARY};
use axum::http::request::Parts;
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use inertia_server::headers::INERTIA;
use inertia_server::{InertiaEngine, InertiaError, InertiaHeaders, Props, Render, RequestContext};
use serde_json::{Map, Value};

use crate::error::AxumError;
use crate::middleware::location_response;
use crate::session::Session;

pub(crate) fn inertia_headers(headers: &HeaderMap) -> InertiaHeaders {
  InertiaHeaders::from_pairs(
    headers.iter().filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?))),
  )
}

pub(crate) fn request_url(uri: &Uri) -> String {
  uri.path_and_query().map_or("/", PathAndQuery::as_str).to_string()
}

/// Handler-side access to the protocol: render pages and issue redirects
/// that carry errors or flash through the session.
#[derive(Clone)]
pub struct Inertia {
  engine: Arc<InertiaEngine>,
  ctx: RequestContext,
}

impl<S> FromRequestParts<S> for Inertia
where
  S: Send + Sync,
{
  type Rejection = AxumError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let engine = parts
      .extensions
      .get::<Arc<InertiaEngine>>()
      .cloned()
      .ok_or_else(|| InertiaError::Config("Inertia extractor used outside InertiaLayer".into()))?;
    let mut ctx = RequestContext::new(
      parts.method.as_str(),
      request_url(&parts.uri),
      inertia_headers(&parts.headers),
    );
    if let Some(Session(store)) = parts.extensions.get::<Session>().cloned() {
      ctx = ctx.with_session(store);
    }
    Ok(Self { engine, ctx })
  }
}

impl Inertia {
  /// Name the controller scope and action, enabling scoped shared props
  /// and `Render::action()`.
  pub fn with_action(mut self, controller: impl Into<String>, action: impl Into<String>) -> Self {
    self.ctx = self.ctx.with_action(controller, action);
    self
  }

  pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
    self.ctx = self.ctx.with_data(data);
    self
  }

  pub fn context(&self) -> &RequestContext {
    &self.ctx
  }

  pub fn engine(&self) -> &Arc<InertiaEngine> {
    &self.engine
  }

  pub fn is_inertia(&self) -> bool {
    self.ctx.is_inertia()
  }

  pub async fn render(&self, component: &str, props: Props) -> Result<Response, AxumError> {
    self.render_with(Render::component(component).props(props)).await
  }

  /// JSON page for protocol requests, full HTML document otherwise.
  pub async fn render_with(&self, render: Render) -> Result<Response, AxumError> {
    let rendered = self.engine.render_page(&self.ctx, render).await?;
    let mut response = if self.ctx.is_inertia() {
      let mut response = Json(&rendered.page).into_response();
      let value = HeaderValue::from_static("true");
      response.headers_mut().insert(HeaderName::from_static(INERTIA), value);
      response
    } else {
      Html(self.engine.render_document(&rendered).await?).into_response()
    };
    vary_on_inertia(response.headers_mut());
    Ok(response)
  }

  /// Visit a URL outside the client app. Protocol requests get `409` with
  /// `X-Inertia-Location`; plain requests a normal redirect.
  pub fn location(&self, url: &str) -> Response {
    if self.ctx.is_inertia() { location_response(url) } else { found(url) }
  }

  /// `302 Found`. The middleware turns it into `303` after PUT, PATCH and
  /// DELETE protocol requests.
  pub fn redirect(&self, to: &str) -> Response {
    found(to)
  }

  pub fn redirect_with_errors(&self, to: &str, errors: Value) -> Result<Response, AxumError> {
    self.engine.redirect_with_errors(&self.ctx, errors)?;
    Ok(found(to))
  }

  pub fn redirect_with_flash(
    &self,
    to: &str,
    flash: Map<String, Value>,
  ) -> Result<Response, AxumError> {
    self.engine.redirect_with_flash(&self.ctx, flash)?;
    Ok(found(to))
  }

  /// Ask the next rendered page to clear the client's history state.
  pub fn clear_history(&self) -> Result<(), AxumError> {
    self.engine.clear_history(&self.ctx)?;
    Ok(())
  }
}

/// Add `X-Inertia` to `Vary`, keeping whatever is already listed.
pub(crate) fn vary_on_inertia(headers: &mut HeaderMap) {
  let listed = headers
    .get_all(VARY)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .any(|v| v.trim().eq_ignore_ascii_case("x-inertia"));
  if !listed {
    headers.append(VARY, HeaderValue::from_static("X-Inertia"));
  }
}

fn found(to: &str) -> Response {
  (StatusCode::FOUND, [(LOCATION, to.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::MemorySessions;
  use crate::{InertiaLayer, InertiaRouterExt};
  use axum::Router;
  use axum::body::Body;
  use axum::http::Request;
  use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
  use axum::routing::get;
  use http_body_util::BodyExt;
  use inertia_server::{InertiaServer, optional};
  use serde_json::json;
  use tower::ServiceExt;

  async fn users(inertia: Inertia) -> Result<Response, AxumError> {
    let props = Props::new()
      .with("name", json!("Brandon"))
      .with("stats", optional(inertia_server::Prop::from_sync(|_| json!({"count": 3}))));
    inertia.render("Users/Index", props).await
  }

  async fn store(inertia: Inertia) -> Result<Response, AxumError> {
    inertia.redirect_with_errors("/users", json!({"email": "taken"}))
  }

  async fn update(inertia: Inertia) -> Response {
    inertia.redirect("/users")
  }

  async fn away(inertia: Inertia) -> Response {
    inertia.location("https://example.com/billing")
  }

  fn app() -> Router {
    let engine = Arc::new(InertiaServer::new().version("v1").build().unwrap());
    Router::new()
      .route("/users", get(users).post(store).put(update))
      .route("/away", get(away))
      .with_inertia(engine, &MemorySessions::new())
  }

  fn request(method: &str, uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
      builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
  }

  async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  const PROTOCOL: [(&str, &str); 2] = [("X-Inertia", "true"), ("X-Inertia-Version", "v1")];

  #[tokio::test]
  async fn full_load_renders_document() {
    let response = app().oneshot(request("GET", "/users", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[VARY], "X-Inertia");
    assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    let html = body_text(response).await;
    assert!(html.contains(r#"<div id="app" data-page=""#));
    assert!(html.contains("Users/Index"));
    assert!(html.contains("Brandon"));
  }

  #[test]
  fn vary_keeps_existing_entries() {
    let mut headers = HeaderMap::new();
    headers.insert(VARY, HeaderValue::from_static("Accept-Encoding"));
    vary_on_inertia(&mut headers);
    vary_on_inertia(&mut headers);
    let values: Vec<_> = headers.get_all(VARY).iter().map(|v| v.to_str().unwrap()).collect();
    assert_eq!(values, vec!["Accept-Encoding", "X-Inertia"]);
  }

  #[tokio::test]
  async fn protocol_request_gets_json_page() {
    let response = app().oneshot(request("GET", "/users?page=2", &PROTOCOL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-inertia"], "true");
    assert_eq!(response.headers()[VARY], "X-Inertia");
    let page = body_json(response).await;
    assert_eq!(page["component"], "Users/Index");
    assert_eq!(page["url"], "/users?page=2");
    assert_eq!(page["version"], "v1");
    assert_eq!(page["props"], json!({"errors": {}, "name": "Brandon"}));
  }

  #[tokio::test]
  async fn partial_reload_returns_requested_props() {
    let mut headers = PROTOCOL.to_vec();
    headers.push(("X-Inertia-Partial-Component", "Users/Index"));
    headers.push(("X-Inertia-Partial-Data", "stats"));
    let response = app().oneshot(request("GET", "/users", &headers)).await.unwrap();
    let page = body_json(response).await;
    assert_eq!(page["props"], json!({"errors": {}, "stats": {"count": 3}}));
  }

  #[tokio::test]
  async fn stale_version_forces_reload() {
    let headers = [("X-Inertia", "true"), ("X-Inertia-Version", "v0")];
    let response = app().oneshot(request("GET", "/users?page=2", &headers)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response.headers()["x-inertia-location"], "/users?page=2");
  }

  #[tokio::test]
  async fn stale_version_ignored_for_writes() {
    let headers = [("X-Inertia", "true"), ("X-Inertia-Version", "v0")];
    let response = app().oneshot(request("PUT", "/users", &headers)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
  }

  #[tokio::test]
  async fn put_redirect_becomes_see_other() {
    let response = app().oneshot(request("PUT", "/users", &PROTOCOL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/users");

    let plain = app().oneshot(request("PUT", "/users", &[])).await.unwrap();
    assert_eq!(plain.status(), StatusCode::FOUND);
  }

  #[tokio::test]
  async fn errors_survive_redirect_and_stale_then_deliver_once() {
    let app = app();
    let response = app.clone().oneshot(request("POST", "/users", &PROTOCOL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("inertia_session="));

    let stale = [("X-Inertia", "true"), ("X-Inertia-Version", "v0"), ("cookie", cookie.as_str())];
    let response = app.clone().oneshot(request("GET", "/users", &stale)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let fresh = [("X-Inertia", "true"), ("X-Inertia-Version", "v1"), ("cookie", cookie.as_str())];
    let response = app.clone().oneshot(request("GET", "/users", &fresh)).await.unwrap();
    assert!(!response.headers().contains_key(SET_COOKIE));
    let page = body_json(response).await;
    assert_eq!(page["props"]["errors"], json!({"email": "taken"}));

    let response = app.oneshot(request("GET", "/users", &fresh)).await.unwrap();
    let page = body_json(response).await;
    assert_eq!(page["props"]["errors"], json!({}));
  }

  #[tokio::test]
  async fn location_depends_on_request_kind() {
    let response = app().oneshot(request("GET", "/away", &PROTOCOL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response.headers()["x-inertia-location"], "https://example.com/billing");

    let response = app().oneshot(request("GET", "/away", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "https://example.com/billing");
  }

  #[tokio::test]
  async fn extractor_without_layer_is_a_config_error() {
    let app = Router::new().route("/users", get(users));
    let response = app.oneshot(request("GET", "/users", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "CONFIG_ERROR");
  }

  #[tokio::test]
  async fn redirect_without_session_is_a_config_error() {
    let engine = Arc::new(InertiaServer::new().build().unwrap());
    let app = Router::new()
      .route("/users", get(users).post(store))
      .layer(InertiaLayer::new(engine).middleware());
    let response = app.oneshot(request("POST", "/users", &[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
