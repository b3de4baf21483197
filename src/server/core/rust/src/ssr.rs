/* src/server/core/rust/src/ssr.rs */

use std::time::Duration;

use inertia_engine::Page;
use serde::Deserialize;

use crate::errors::InertiaError;

const SSR_TIMEOUT: Duration = Duration::from_secs(5);

/// What the SSR server answers for one page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SsrResponse {
  #[serde(default)]
  pub head: Vec<String>,
  pub body: String,
}

/// Client for an external SSR renderer. The page JSON is POSTed to
/// `{url}/render`.
#[derive(Debug, Clone)]
pub struct SsrClient {
  http: reqwest::Client,
  url: String,
}

impl SsrClient {
  pub fn new(url: impl Into<String>) -> Result<Self, InertiaError> {
    let http = reqwest::Client::builder()
      .timeout(SSR_TIMEOUT)
      .build()
      .map_err(|e| InertiaError::Ssr(e.to_string()))?;
    Ok(Self { http, url: url.into() })
  }

  pub fn endpoint(&self) -> String {
    format!("{}/render", self.url.trim_end_matches('/'))
  }

  pub async fn render(&self, page: &Page) -> Result<SsrResponse, InertiaError> {
    let response = self
      .http
      .post(self.endpoint())
      .json(page)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(|e| InertiaError::Ssr(e.to_string()))?;
    response.json::<SsrResponse>().await.map_err(|e| InertiaError::Ssr(e.to_string()))
  }
}
