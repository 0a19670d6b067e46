//! [`ScimClient`], a thin reqwest wrapper over the SCIM 2.0 endpoints the
//! sync engine uses.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
  Result, ScimError,
  model::{ListResponse, PatchRequest, ScimGroup, ScimUser},
};

const SCIM_CONTENT_TYPE: &str = "application/scim+json";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for a SCIM service.
#[derive(Debug, Clone)]
pub struct ScimConfig {
  /// Base URL, e.g. `https://scim.example.com/scim/v2`.
  pub endpoint:     String,
  pub access_token: String,
  pub timeout:      Duration,
  /// `count` requested per page when listing.
  pub page_size:    usize,
}

impl Default for ScimConfig {
  fn default() -> Self {
    Self {
      endpoint:     String::new(),
      access_token: String::new(),
      timeout:      Duration::from_secs(30),
      page_size:    100,
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// An authenticated SCIM 2.0 client.
///
/// Cloning is cheap; the inner connection pool is shared.
#[derive(Debug, Clone)]
pub struct ScimClient {
  base_url:  String,
  token:     String,
  page_size: usize,
  http:      Client,
}

impl ScimClient {
  pub fn new(config: &ScimConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("idpscim/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self::with_http_client(config, http))
  }

  /// Build around an existing reqwest client.
  pub fn with_http_client(config: &ScimConfig, http: Client) -> Self {
    Self {
      base_url: config.endpoint.trim_end_matches('/').to_owned(),
      token: config.access_token.clone(),
      page_size: config.page_size.max(1),
      http,
    }
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  // ── Users ─────────────────────────────────────────────────────────────

  /// Every user, following pagination to the end.
  pub async fn list_users(&self) -> Result<Vec<ScimUser>> {
    self.list_all("Users").await
  }

  pub async fn create_user(&self, user: &ScimUser) -> Result<ScimUser> {
    let req = self.request(Method::POST, "Users").json(user);
    self.send_json(req).await
  }

  pub async fn replace_user(&self, id: &str, user: &ScimUser) -> Result<ScimUser> {
    let req = self.request(Method::PUT, &format!("Users/{id}")).json(user);
    self.send_json(req).await
  }

  pub async fn delete_user(&self, id: &str) -> Result<()> {
    self.send(self.request(Method::DELETE, &format!("Users/{id}"))).await
  }

  // ── Groups ────────────────────────────────────────────────────────────

  /// Every group, following pagination to the end.
  pub async fn list_groups(&self) -> Result<Vec<ScimGroup>> {
    self.list_all("Groups").await
  }

  /// A single group including its `members`.
  pub async fn get_group(&self, id: &str) -> Result<ScimGroup> {
    self
      .send_json(self.request(Method::GET, &format!("Groups/{id}")))
      .await
  }

  pub async fn create_group(&self, group: &ScimGroup) -> Result<ScimGroup> {
    let req = self.request(Method::POST, "Groups").json(group);
    self.send_json(req).await
  }

  /// Apply a PatchOp request. Any response body is ignored.
  pub async fn patch_group(&self, id: &str, patch: &PatchRequest) -> Result<()> {
    let req = self.request(Method::PATCH, &format!("Groups/{id}")).json(patch);
    self.send(req).await
  }

  pub async fn delete_group(&self, id: &str) -> Result<()> {
    self.send(self.request(Method::DELETE, &format!("Groups/{id}"))).await
  }

  // ── Plumbing ──────────────────────────────────────────────────────────

  async fn list_all<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>> {
    let mut out: Vec<T> = vec![];
    let mut start_index = 1usize;

    loop {
      let req = self.request(Method::GET, resource).query(&[
        ("startIndex", start_index.to_string()),
        ("count", self.page_size.to_string()),
      ]);
      let page: ListResponse<T> = self.send_json(req).await?;
      let received = page.resources.len();
      debug!(resource, start_index, received, total = page.total_results, "fetched page");

      out.extend(page.resources);
      if received == 0 || out.len() >= page.total_results {
        break;
      }
      start_index += received;
    }

    Ok(out)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let url = format!("{}/{}", self.base_url, path);
    debug!(%method, %url, "SCIM request");
    self
      .http
      .request(method, url)
      .bearer_auth(&self.token)
      .header(header::ACCEPT, SCIM_CONTENT_TYPE)
      .header(header::CONTENT_TYPE, SCIM_CONTENT_TYPE)
  }

  async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
    let response = check(req.send().await?).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }

  async fn send(&self, req: RequestBuilder) -> Result<()> {
    check(req.send().await?).await?;
    Ok(())
  }
}

/// Turn a non-2xx response into [`ScimError::Status`].
async fn check(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  Err(ScimError::Status {
    status: status.as_u16(),
    body,
  })
}
