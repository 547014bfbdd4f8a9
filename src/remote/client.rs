//! HTTP client for the recipe API.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::error::StoreError;
use crate::recipe::api_types::ApiRecipe;
use crate::recipe::types::{Recipe, RecipeDraft, RecipePatch};

use super::retry::{with_retry, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS};
use super::RemoteApi;

/// Probes must answer fast; a slow server is treated as unreachable.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  token: Option<String>,
}

/// Reachability responses vary across server builds; every known field is
/// optional and checked in turn.
#[derive(Debug, Deserialize)]
struct ProbeResponse {
  #[serde(default)]
  connected: Option<bool>,
  #[serde(default)]
  success: Option<bool>,
  #[serde(default)]
  message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
  #[serde(default)]
  error: Option<String>,
  #[serde(default)]
  message: Option<String>,
}

impl ApiClient {
  pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
    // Url::join treats a path without a trailing slash as a file and would
    // drop its last segment.
    let normalized = if base_url.ends_with('/') {
      base_url.to_string()
    } else {
      format!("{}/", base_url)
    };
    let base_url =
      Url::parse(&normalized).map_err(|e| eyre!("Invalid API base URL {}: {}", base_url, e))?;

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
    self
      .base_url
      .join(path)
      .map_err(|e| StoreError::Transient(format!("invalid endpoint {}: {}", path, e)))
  }

  fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Map a non-success response to the matching error, consuming the body
  /// for the server's message when it has one.
  async fn error_for(&self, response: reqwest::Response) -> StoreError {
    let status = response.status();
    let detail = response
      .json::<ApiError>()
      .await
      .ok()
      .and_then(|e| e.error.or(e.message))
      .unwrap_or_else(|| status.to_string());

    if status == reqwest::StatusCode::BAD_REQUEST {
      StoreError::Validation(detail)
    } else {
      StoreError::Transient(format!("{}: {}", status, detail))
    }
  }

  async fn fetch_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
    let url = self.endpoint("recipes")?;
    let response = self.http.get(url).timeout(READ_TIMEOUT).send().await?;
    if !response.status().is_success() {
      return Err(self.error_for(response).await);
    }
    let rows: Vec<ApiRecipe> = response.json().await?;
    Ok(rows.into_iter().map(ApiRecipe::into_recipe).collect())
  }

  async fn send_create(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
    let url = self.endpoint("recipes")?;
    let response = self
      .authorize(self.http.post(url))
      .timeout(WRITE_TIMEOUT)
      .json(draft)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(self.error_for(response).await);
    }
    let row: ApiRecipe = response.json().await?;
    Ok(row.into_recipe())
  }

  async fn send_update(&self, id: &str, patch: &RecipePatch) -> Result<Recipe, StoreError> {
    let url = self.endpoint(&format!("recipes/{}", id))?;
    let response = self
      .authorize(self.http.put(url))
      .timeout(WRITE_TIMEOUT)
      .json(patch)
      .send()
      .await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Err(StoreError::NotFound(id.to_string()));
    }
    if !response.status().is_success() {
      return Err(self.error_for(response).await);
    }
    let row: ApiRecipe = response.json().await?;
    Ok(row.into_recipe())
  }

  async fn send_delete(&self, id: &str) -> Result<(), StoreError> {
    let url = self.endpoint(&format!("recipes/{}", id))?;
    let response = self
      .authorize(self.http.delete(url))
      .timeout(READ_TIMEOUT)
      .send()
      .await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
      warn!("delete of {} found nothing to delete", id);
      return Ok(());
    }
    if !response.status().is_success() {
      return Err(self.error_for(response).await);
    }
    Ok(())
  }
}

impl RemoteApi for ApiClient {
  async fn probe(&self) -> bool {
    let url = match self.endpoint("test-connection") {
      Ok(url) => url,
      Err(_) => return false,
    };

    let response = match self.http.get(url).timeout(PROBE_TIMEOUT).send().await {
      Ok(response) => response,
      Err(e) => {
        warn!("probe failed: {}", e);
        return false;
      }
    };
    if !response.status().is_success() {
      warn!("probe got status {}", response.status());
      return false;
    }

    match response.json::<ProbeResponse>().await {
      Ok(body) => {
        body.connected == Some(true)
          || body.success == Some(true)
          || body
            .message
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains("connected"))
      }
      Err(e) => {
        warn!("probe body unreadable: {}", e);
        false
      }
    }
  }

  async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
    with_retry(
      || self.fetch_recipes(),
      DEFAULT_MAX_ATTEMPTS,
      DEFAULT_INITIAL_DELAY,
    )
    .await
  }

  async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
    let url = self.endpoint(&format!("recipes/{}", id))?;
    let response = self.http.get(url).timeout(READ_TIMEOUT).send().await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !response.status().is_success() {
      return Err(self.error_for(response).await);
    }
    let row: ApiRecipe = response.json().await?;
    Ok(Some(row.into_recipe()))
  }

  async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
    with_retry(
      || self.send_create(draft),
      DEFAULT_MAX_ATTEMPTS,
      DEFAULT_INITIAL_DELAY,
    )
    .await
  }

  async fn update_recipe(&self, id: &str, patch: &RecipePatch) -> Result<Recipe, StoreError> {
    with_retry(
      || self.send_update(id, patch),
      DEFAULT_MAX_ATTEMPTS,
      DEFAULT_INITIAL_DELAY,
    )
    .await
  }

  async fn delete_recipe(&self, id: &str) -> Result<(), StoreError> {
    with_retry(
      || self.send_delete(id),
      DEFAULT_MAX_ATTEMPTS,
      DEFAULT_INITIAL_DELAY,
    )
    .await
  }
}
