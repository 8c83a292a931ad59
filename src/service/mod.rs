//! Remote scanning service client.
//!
//! The adapter talks to MobSF through the [`ScanService`] trait so the
//! dispatcher and poller stay testable against a substituted client; the
//! real implementation lives in [`http::HttpScanService`].

pub mod http;

pub use http::HttpScanService;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A single request/response exchange against the remote service.
///
/// Failures are split into the two classes the rest of the system cares
/// about: a response arrived with a failure status, or no response
/// arrived at all.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service responded with a non-success status.
    #[error("HTTP {status}: {}", render_detail(.body, .message))]
    Status {
        status: u16,
        /// Response body, when it parsed as JSON.
        body: Option<Value>,
        /// Raw response text, used when the body is not JSON.
        message: String,
    },
    /// The request never produced a response.
    #[error("Network/unknown error: {0}")]
    Transport(String),
}

impl ServiceError {
    /// HTTP status of the failure, if the service responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            ServiceError::Transport(_) => None,
        }
    }
}

fn render_detail(body: &Option<Value>, message: &str) -> String {
    match body {
        Some(value) => value.to_string(),
        None => message.to_string(),
    }
}

/// Request/response contract with the remote scanning service.
///
/// One method per exchange shape; endpoint paths are chosen by the
/// operation bodies, not here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScanService: Send + Sync {
    /// Uploads an artifact via multipart form and returns the JSON body.
    async fn upload(&self, file_name: &str, contents: Vec<u8>) -> Result<Value, ServiceError>;

    /// POSTs a form-encoded request and returns the JSON body.
    async fn post_form(
        &self,
        path: &str,
        form: Vec<(String, String)>,
    ) -> Result<Value, ServiceError>;

    /// GETs with a query string and returns the JSON body.
    async fn get(&self, path: &str, query: Vec<(String, String)>) -> Result<Value, ServiceError>;

    /// POSTs a form-encoded request and returns the raw response bytes.
    async fn post_form_bytes(
        &self,
        path: &str,
        form: Vec<(String, String)>,
    ) -> Result<Vec<u8>, ServiceError>;
}

/// Builds the form pairs used by the hash-keyed endpoints.
pub(crate) fn hash_form(hash: &str) -> Vec<(String, String)> {
    vec![("hash".to_string(), hash.to_string())]
}
