//! `reqwest`-backed implementation of [`ScanService`].

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{ScanService, ServiceError};
use crate::config::{ConfigError, ServiceConfig};

/// Per-request timeout; poll pacing is handled above this layer.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for the MobSF REST API.
///
/// The API key rides on every request as the `Authorization` header,
/// installed once as a default header at construction.
#[derive(Debug, Clone)]
pub struct HttpScanService {
    client: Client,
    base_url: String,
}

impl HttpScanService {
    /// Builds a client from validated configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(config.api_key())
                .map_err(|_| ConfigError::InvalidApiKey)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Decodes a response into JSON, or into the failure classification
    /// the poller and classifier key on.
    async fn decode_json(response: Response) -> Result<Value, ServiceError> {
        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::Transport(format!("invalid JSON response: {}", e)))
    }

    async fn read_failure(response: Response) -> ServiceError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&message).ok();
        ServiceError::Status {
            status,
            body,
            message,
        }
    }
}

#[async_trait]
impl ScanService for HttpScanService {
    async fn upload(&self, file_name: &str, contents: Vec<u8>) -> Result<Value, ServiceError> {
        debug!(file_name, size = contents.len(), "uploading artifact");

        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("api/v1/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Self::decode_json(response).await
    }

    async fn post_form(
        &self,
        path: &str,
        form: Vec<(String, String)>,
    ) -> Result<Value, ServiceError> {
        debug!(path, "POST form");

        let response = self
            .client
            .post(self.url(path))
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Self::decode_json(response).await
    }

    async fn get(&self, path: &str, query: Vec<(String, String)>) -> Result<Value, ServiceError> {
        debug!(path, "GET");

        let response = self
            .client
            .get(self.url(path))
            .query(&query)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Self::decode_json(response).await
    }

    async fn post_form_bytes(
        &self,
        path: &str,
        form: Vec<(String, String)>,
    ) -> Result<Vec<u8>, ServiceError> {
        debug!(path, "POST form (binary response)");

        let response = self
            .client
            .post(self.url(path))
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining_handles_slashes() {
        let config = ServiceConfig::new("http://127.0.0.1:8000/", "key").unwrap();
        let service = HttpScanService::new(&config).unwrap();
        assert_eq!(
            service.url("/api/v1/scans"),
            "http://127.0.0.1:8000/api/v1/scans"
        );
        assert_eq!(
            service.url("api/v1/scans"),
            "http://127.0.0.1:8000/api/v1/scans"
        );
    }

    #[test]
    fn non_header_safe_api_key_is_rejected() {
        let config = ServiceConfig::new("http://127.0.0.1:8000", "bad\nkey").unwrap();
        assert!(matches!(
            HttpScanService::new(&config),
            Err(ConfigError::InvalidApiKey)
        ));
    }
}
