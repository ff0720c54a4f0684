//! Shared HTTP plumbing for the persistence API.
//!
//! Requests are timed and carry the configured bearer token. Non-2xx answers
//! become [`ApiClientError::Status`]; nothing is retried.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::ApiConfig;
use crate::error::ApiClientError;
use crate::metrics::RequestTimer;

/// Client for the persistence API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PersistenceClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    timeout_ms: u64,
}

impl PersistenceClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiClientError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ApiClientError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, url = %url, "Calling persistence API");

        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and fails on transport errors or non-2xx statuses.
    pub async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ApiClientError> {
        match self.dispatch(operation, request, false).await? {
            Some(response) => Ok(response),
            None => Err(ApiClientError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                code: String::new(),
                message: "Not found".to_string(),
            }),
        }
    }

    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiClientError> {
        let response = self.execute(operation, request).await?;
        Self::decode_body(response).await
    }

    /// Like [`PersistenceClient::execute_json`], but a 404 is `Ok(None)`.
    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Option<T>, ApiClientError> {
        match self.dispatch(operation, request, true).await? {
            Some(response) => Ok(Some(Self::decode_body(response).await?)),
            None => Ok(None),
        }
    }

    /// `Ok(None)` only for a 404 when `missing_is_ok` is set.
    async fn dispatch(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        missing_is_ok: bool,
    ) -> Result<Option<Response>, ApiClientError> {
        let timer = RequestTimer::new(operation);

        let result = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(Some(response)),
            Ok(response) if missing_is_ok && response.status() == StatusCode::NOT_FOUND => Ok(None),
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Err(ApiClientError::from_status_body(status, &body))
            }
            Err(e) if e.is_timeout() => Err(ApiClientError::Timeout(self.timeout_ms)),
            Err(e) => Err(ApiClientError::Http(e)),
        };

        timer.finish(result.is_ok());
        if let Err(e) = &result {
            error!(operation, error = %e, "Persistence API request failed");
        }
        result
    }

    async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T, ApiClientError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiClientError::InvalidResponse(e.to_string()))
    }
}
