//! Call dispatch: lookup, validation, execution, classification.
//!
//! [`Dispatcher::invoke`] is the single seam where "succeeded" versus
//! "failed" is decided; every path, including an unknown tool name,
//! terminates in a constructed [`CallResult`].

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::catalog::ToolCatalog;
use super::validate::{ValidatedArguments, validate};
use super::{CallRequest, CallResult, ops};
use crate::error::{ErrorKind, ToolError};
use crate::service::ScanService;

/// Routes call requests to their operation bodies.
pub struct Dispatcher {
    catalog: ToolCatalog,
    service: Arc<dyn ScanService>,
}

impl Dispatcher {
    pub fn new(catalog: ToolCatalog, service: Arc<dyn ScanService>) -> Self {
        Self { catalog, service }
    }

    /// Dispatcher over the full MobSF tool set.
    pub fn with_standard_catalog(service: Arc<dyn ScanService>) -> Self {
        Self::new(ToolCatalog::standard(), service)
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Resolves one call to a terminal result. Never panics and never
    /// propagates an error past this boundary.
    pub async fn invoke(&self, request: CallRequest) -> CallResult {
        let Some(descriptor) = self.catalog.lookup(&request.name) else {
            debug!(tool = %request.name, "unknown tool");
            return CallResult::failure(
                ErrorKind::NotFound,
                format!("Unknown tool: {}", request.name),
            );
        };

        let args = match validate(descriptor, &request.arguments) {
            Ok(args) => args,
            Err(error) => {
                debug!(tool = %request.name, %error, "argument validation failed");
                return CallResult::from(error);
            }
        };

        match self.run(descriptor.name, &args).await {
            Ok(payload) => {
                debug!(tool = %request.name, "call succeeded");
                CallResult::success(payload)
            }
            Err(error) => {
                debug!(tool = %request.name, kind = ?error.kind(), %error, "call failed");
                CallResult::from(error)
            }
        }
    }

    async fn run(&self, name: &str, args: &ValidatedArguments) -> Result<Value, ToolError> {
        let service = self.service.as_ref();
        match name {
            "upload_mobile_app" => ops::upload_mobile_app(service, args).await,
            "scan_mobile_app" => ops::scan_mobile_app(service, args).await,
            "get_scan_report_json" => ops::get_scan_report_json(service, args).await,
            "get_scan_report_pdf" => ops::get_scan_report_pdf(service, args).await,
            "view_source_code" => ops::view_source_code(service, args).await,
            "compare_apps" => ops::compare_apps(service, args).await,
            "get_recent_scans" | "list_uploaded_apps" => {
                ops::get_recent_scans(service, args).await
            }
            "delete_scan" => ops::delete_scan(service, args).await,
            "cancel_scan" => ops::cancel_scan(service, args).await,
            "get_app_scorecard" => ops::get_app_scorecard(service, args).await,
            "suppress_finding" => ops::suppress_finding(service, args).await,
            "health_check" => ops::health_check(service).await,
            "wait_for_report" => ops::wait_for_report(service, args).await,
            "get_scan_status" => ops::get_scan_status(service, args).await,
            "get_scan_metadata" => ops::get_scan_metadata(service, args).await,
            "get_scan_artifacts" => ops::get_scan_artifacts(service, args).await,
            "pipeline_scan" => ops::pipeline_scan(service, args).await,
            // A descriptor registered without a body; kept classified so
            // the invoke boundary still holds.
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{MockScanService, ServiceError};
    use serde_json::json;

    fn dispatcher(service: MockScanService) -> Dispatcher {
        Dispatcher::with_standard_catalog(Arc::new(service))
    }

    #[tokio::test]
    async fn unknown_tool_is_a_structured_failure() {
        let result = dispatcher(MockScanService::new())
            .invoke(CallRequest::new("frobnicate", json!({})))
            .await;
        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::NotFound);
                assert_eq!(message, "Unknown tool: frobnicate");
            }
            CallResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn validation_failure_lists_every_violation() {
        let result = dispatcher(MockScanService::new())
            .invoke(CallRequest::new(
                "view_source_code",
                json!({"type": "exe", "file": 7}),
            ))
            .await;
        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::Validation);
                assert!(message.contains("missing required argument: hash"));
                assert!(message.contains("file: expected string, got number"));
                assert!(message.contains("type: invalid value 'exe'"));
            }
            CallResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn negative_page_is_rejected_by_validation() {
        // No expectations on the mock: the call must never reach the
        // remote service.
        let result = dispatcher(MockScanService::new())
            .invoke(CallRequest::new("get_recent_scans", json!({"page": -1})))
            .await;
        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::Validation);
                assert!(message.contains("page: expected non-negative integer"));
            }
            CallResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn upstream_failure_renders_status_and_body() {
        let mut service = MockScanService::new();
        service.expect_post_form().times(1).returning(|_, _| {
            Err(ServiceError::Status {
                status: 500,
                body: Some(json!({"error": "scan failed"})),
                message: String::new(),
            })
        });

        let result = dispatcher(service)
            .invoke(CallRequest::new("get_scan_report_json", json!({"hash": "abc"})))
            .await;
        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::Upstream);
                assert_eq!(message, r#"HTTP 500: {"error":"scan failed"}"#);
            }
            CallResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_classified_separately() {
        let mut service = MockScanService::new();
        service
            .expect_get()
            .times(1)
            .returning(|_, _| Err(ServiceError::Transport("connection refused".into())));

        let result = dispatcher(service)
            .invoke(CallRequest::new("health_check", json!({})))
            .await;
        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::Transport);
                assert_eq!(message, "Network/unknown error: connection refused");
            }
            CallResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn success_wraps_the_remote_payload() {
        let mut service = MockScanService::new();
        service
            .expect_get()
            .times(1)
            .returning(|_, _| Ok(json!({"content": [{"MD5": "abc"}]})));

        let result = dispatcher(service)
            .invoke(CallRequest::new("get_recent_scans", json!({"page": 2})))
            .await;
        match result {
            CallResult::Success { payload } => {
                assert_eq!(payload["content"][0]["MD5"], "abc");
            }
            CallResult::Failure { message, .. } => panic!("expected success: {}", message),
        }
    }

    #[tokio::test]
    async fn alias_routes_to_the_same_operation() {
        let mut service = MockScanService::new();
        service
            .expect_get()
            .times(1)
            .withf(|path, _| path == "api/v1/scans")
            .returning(|_, _| Ok(json!({"content": []})));

        let result = dispatcher(service)
            .invoke(CallRequest::new("list_uploaded_apps", json!({})))
            .await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn end_to_end_upload_scan_wait() {
        let mut service = MockScanService::new();
        service
            .expect_upload()
            .times(1)
            .returning(|_, _| Ok(json!({"hash": "h1"})));
        service
            .expect_post_form()
            .withf(|path, _| path == "api/v1/scan")
            .times(1)
            .returning(|_, _| Ok(json!({"scan_id": "s1"})));
        service
            .expect_post_form()
            .withf(|path, _| path == "api/v1/report_json")
            .times(1)
            .returning(|_, _| Ok(json!({"package_name": "com.example"})));

        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app.apk");
        std::fs::write(&app, b"fake apk").unwrap();

        let dispatcher = dispatcher(service);

        let uploaded = dispatcher
            .invoke(CallRequest::new(
                "upload_mobile_app",
                json!({"file_path": app.to_str().unwrap()}),
            ))
            .await;
        let CallResult::Success { payload } = uploaded else {
            panic!("upload failed");
        };
        let hash = payload["hash"].as_str().unwrap().to_string();
        assert_eq!(hash, "h1");

        let scanned = dispatcher
            .invoke(CallRequest::new(
                "scan_mobile_app",
                json!({"hash": hash, "scan_type": "apk"}),
            ))
            .await;
        let CallResult::Success { payload } = scanned else {
            panic!("scan failed");
        };
        assert_eq!(payload["scan_id"], "s1");

        let waited = dispatcher
            .invoke(CallRequest::new(
                "wait_for_report",
                json!({"hash": "h1", "interval_ms": 10, "timeout_ms": 1000}),
            ))
            .await;
        let CallResult::Success { payload } = waited else {
            panic!("wait failed");
        };
        assert_eq!(payload["status"], "ready");
        assert_eq!(payload["report"]["package_name"], "com.example");
    }
}
