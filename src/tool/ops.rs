//! Operation bodies behind the catalog descriptors.
//!
//! Each body receives already-validated arguments and the remote service
//! client, performs its exchange(s), and returns a JSON payload or a
//! classified error. One-shot operations make exactly one request.

use serde_json::{Map, Value, json};
use std::path::Path;
use std::time::Duration;

use super::poll;
use super::validate::ValidatedArguments;
use crate::error::ToolError;
use crate::service::{ScanService, hash_form};

/// Fixed field set projected by `get_scan_metadata`.
const METADATA_FIELDS: [&str; 12] = [
    "file_name",
    "size",
    "scan_type",
    "md5",
    "sha1",
    "sha256",
    "package_name",
    "app_name",
    "version_name",
    "version_code",
    "sdk_version",
    "target_sdk_version",
];

/// Copies the named top-level fields out of a report, omitting any the
/// report does not carry (no null placeholders).
fn project_fields<'a>(report: &Value, fields: impl IntoIterator<Item = &'a str>) -> Value {
    let mut out = Map::new();
    if let Some(source) = report.as_object() {
        for field in fields {
            if let Some(value) = source.get(field) {
                out.insert(field.to_string(), value.clone());
            }
        }
    }
    Value::Object(out)
}

pub(crate) async fn upload_mobile_app(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let file_path = args.str("file_path")?;
    let contents = tokio::fs::read(file_path)
        .await
        .map_err(|e| ToolError::Internal(format!("failed to read {}: {}", file_path, e)))?;
    let file_name = Path::new(file_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin");
    Ok(service.upload(file_name, contents).await?)
}

pub(crate) async fn scan_mobile_app(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let mut form = hash_form(args.str("hash")?);
    form.push(("scan_type".to_string(), args.str("scan_type")?.to_string()));
    form.push((
        "re_scan".to_string(),
        if args.bool_or("re_scan", false) { "1" } else { "0" }.to_string(),
    ));
    Ok(service.post_form("api/v1/scan", form).await?)
}

pub(crate) async fn get_scan_report_json(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    Ok(poll::fetch_report(service, args.str("hash")?).await?)
}

pub(crate) async fn get_scan_report_pdf(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let hash = args.str("hash")?;
    let output_path = args.str("output_path")?;
    let bytes = service
        .post_form_bytes("api/v1/download_pdf", hash_form(hash))
        .await?;
    let size = bytes.len();
    tokio::fs::write(output_path, bytes)
        .await
        .map_err(|e| ToolError::Internal(format!("failed to write {}: {}", output_path, e)))?;
    Ok(json!({"written_to": output_path, "bytes": size}))
}

pub(crate) async fn view_source_code(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let mut form = hash_form(args.str("hash")?);
    form.push(("file".to_string(), args.str("file")?.to_string()));
    form.push(("type".to_string(), args.str("type")?.to_string()));
    Ok(service.post_form("api/v1/view_source", form).await?)
}

pub(crate) async fn compare_apps(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let form = vec![
        ("hash1".to_string(), args.str("hash1")?.to_string()),
        ("hash2".to_string(), args.str("hash2")?.to_string()),
    ];
    Ok(service.post_form("api/v1/compare", form).await?)
}

pub(crate) async fn get_recent_scans(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let query = vec![
        ("page".to_string(), args.u64("page")?.to_string()),
        ("page_size".to_string(), args.u64("page_size")?.to_string()),
    ];
    Ok(service.get("api/v1/scans", query).await?)
}

pub(crate) async fn delete_scan(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    Ok(service
        .post_form("api/v1/delete_scan", hash_form(args.str("hash")?))
        .await?)
}

/// Same remote effect as `delete_scan`, rendered as a cancellation.
pub(crate) async fn cancel_scan(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let hash = args.str("hash")?;
    service
        .post_form("api/v1/delete_scan", hash_form(hash))
        .await?;
    Ok(json!({"status": "deleted", "hash": hash}))
}

pub(crate) async fn get_app_scorecard(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    Ok(service
        .post_form("api/v1/scorecard", hash_form(args.str("hash")?))
        .await?)
}

pub(crate) async fn suppress_finding(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let mut form = hash_form(args.str("hash")?);
    form.push(("rule".to_string(), args.str("finding_id")?.to_string()));
    if let Some(reason) = args.opt_str("reason") {
        form.push(("reason".to_string(), reason.to_string()));
    }
    Ok(service.post_form("api/v1/suppress_by_rule", form).await?)
}

/// Lightweight list query proving the server is reachable.
pub(crate) async fn health_check(service: &dyn ScanService) -> Result<Value, ToolError> {
    let query = vec![
        ("page".to_string(), "1".to_string()),
        ("page_size".to_string(), "1".to_string()),
    ];
    service.get("api/v1/scans", query).await?;
    Ok(json!({"status": "ok"}))
}

pub(crate) async fn wait_for_report(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let hash = args.str("hash")?;
    let interval = Duration::from_millis(args.u64("interval_ms")?);
    let timeout = Duration::from_millis(args.u64("timeout_ms")?);
    let report = poll::wait_for_report(service, hash, interval, timeout).await?;
    Ok(json!({"status": "ready", "report": report}))
}

/// Single-shot read of the report endpoint; classifies statuses exactly
/// as the poll loop does so the two agree on "not ready" vs "broken".
pub(crate) async fn get_scan_status(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let hash = args.str("hash")?;
    match poll::fetch_report(service, hash).await {
        Ok(report) => Ok(json!({
            "status": "ready",
            "report": project_fields(&report, ["file_name", "app_name", "package_name", "md5"]),
        })),
        Err(error) if poll::is_retryable(&error) => Ok(json!({
            "status": "pending",
            "detail": error.to_string(),
        })),
        Err(error) => Err(error.into()),
    }
}

pub(crate) async fn get_scan_metadata(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let report = poll::fetch_report(service, args.str("hash")?).await?;
    Ok(project_fields(&report, METADATA_FIELDS))
}

pub(crate) async fn get_scan_artifacts(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let sections = args.str_list("sections")?;
    let report = poll::fetch_report(service, args.str("hash")?).await?;
    Ok(project_fields(
        &report,
        sections.iter().map(String::as_str),
    ))
}

/// Upload → scan → wait for the report → project, with an optional PDF
/// fetch at the end.
pub(crate) async fn pipeline_scan(
    service: &dyn ScanService,
    args: &ValidatedArguments,
) -> Result<Value, ToolError> {
    let uploaded = upload_mobile_app(service, args).await?;
    let hash = uploaded
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::Internal("upload response is missing 'hash'".to_string()))?
        .to_string();

    let mut form = hash_form(&hash);
    form.push(("scan_type".to_string(), args.str("scan_type")?.to_string()));
    form.push(("re_scan".to_string(), "0".to_string()));
    service.post_form("api/v1/scan", form).await?;

    let interval = Duration::from_millis(args.u64("interval_ms")?);
    let timeout = Duration::from_millis(args.u64("timeout_ms")?);
    let report = poll::wait_for_report(service, &hash, interval, timeout).await?;

    let sections = args.str_list("sections")?;
    let mut out = json!({
        "hash": hash,
        "metadata": project_fields(&report, METADATA_FIELDS),
        "artifacts": project_fields(&report, sections.iter().map(String::as_str)),
    });

    if args.bool_or("fetch_pdf", false) {
        let output_path = args.str("output_path")?;
        let bytes = service
            .post_form_bytes("api/v1/download_pdf", hash_form(&hash))
            .await?;
        tokio::fs::write(output_path, bytes)
            .await
            .map_err(|e| ToolError::Internal(format!("failed to write {}: {}", output_path, e)))?;
        out["report_pdf"] = json!(output_path);
    }

    Ok(out)
}
