//! The fixed tool catalog: registration-ordered descriptors with
//! exact-name lookup. Populated once at startup, never mutated after.

use std::collections::HashMap;
use std::fmt;

use serde_json::json;

use super::{ParamKind, ParamSpec, ToolDescriptor};

const SCAN_TYPES: &[&str] = &["apk", "ipa", "zip"];

/// Default top-level report sections projected by `get_scan_artifacts`.
pub const DEFAULT_ARTIFACT_SECTIONS: &[&str] = &[
    "manifest_analysis",
    "permissions",
    "binaries",
    "malware",
    "entitlements",
    "files",
];

/// Immutable table of tool descriptors.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    order: Vec<ToolDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor. Re-registering a name replaces the
    /// descriptor in place, keeping its original position.
    pub fn register(&mut self, descriptor: ToolDescriptor) {
        match self.index.get(descriptor.name) {
            Some(&i) => self.order[i] = descriptor,
            None => {
                self.index.insert(descriptor.name, self.order.len());
                self.order.push(descriptor);
            }
        }
    }

    /// Looks up a descriptor by exact name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.order[i])
    }

    /// All descriptors in registration order.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The full MobSF tool set.
    pub fn standard() -> Self {
        let mut catalog = Self::new();

        catalog.register(ToolDescriptor::new(
            "upload_mobile_app",
            "Upload a mobile app binary (APK/IPA/ZIP) to MobSF for analysis",
            vec![ParamSpec::required("file_path", ParamKind::Str)],
        ));
        catalog.register(ToolDescriptor::new(
            "scan_mobile_app",
            "Start a scan of a previously uploaded app",
            vec![
                ParamSpec::required("hash", ParamKind::Str),
                ParamSpec::with_default("scan_type", ParamKind::Enum(SCAN_TYPES), json!("apk")),
                ParamSpec::with_default("re_scan", ParamKind::Bool, json!(false)),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "get_scan_report_json",
            "Fetch the full JSON scan report for a scanned app",
            vec![ParamSpec::required("hash", ParamKind::Str)],
        ));
        catalog.register(ToolDescriptor::new(
            "get_scan_report_pdf",
            "Fetch the PDF scan report and write it to a local file",
            vec![
                ParamSpec::required("hash", ParamKind::Str),
                ParamSpec::with_default("output_path", ParamKind::Str, json!("./mobsf_report.pdf")),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "view_source_code",
            "View a source file from a scanned app",
            vec![
                ParamSpec::required("hash", ParamKind::Str),
                ParamSpec::required("file", ParamKind::Str),
                ParamSpec::required("type", ParamKind::Enum(SCAN_TYPES)),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "compare_apps",
            "Compare the scan results of two apps",
            vec![
                ParamSpec::required("hash1", ParamKind::Str),
                ParamSpec::required("hash2", ParamKind::Str),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "get_recent_scans",
            "List recent scans known to MobSF",
            vec![
                ParamSpec::with_default("page", ParamKind::Int, json!(1)),
                ParamSpec::with_default("page_size", ParamKind::Int, json!(100)),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "list_uploaded_apps",
            "List uploaded apps (same listing as get_recent_scans)",
            vec![
                ParamSpec::with_default("page", ParamKind::Int, json!(1)),
                ParamSpec::with_default("page_size", ParamKind::Int, json!(100)),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "delete_scan",
            "Delete scan results for an app",
            vec![ParamSpec::required("hash", ParamKind::Str)],
        ));
        catalog.register(ToolDescriptor::new(
            "cancel_scan",
            "Cancel a scan by deleting its results",
            vec![ParamSpec::required("hash", ParamKind::Str)],
        ));
        catalog.register(ToolDescriptor::new(
            "get_app_scorecard",
            "Fetch the application security scorecard",
            vec![ParamSpec::required("hash", ParamKind::Str)],
        ));
        catalog.register(ToolDescriptor::new(
            "suppress_finding",
            "Suppress a finding in the scan report",
            vec![
                ParamSpec::required("hash", ParamKind::Str),
                ParamSpec::required("finding_id", ParamKind::Str),
                ParamSpec::optional("reason", ParamKind::Str),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "health_check",
            "Check connectivity to the MobSF server",
            vec![],
        ));
        catalog.register(ToolDescriptor::new(
            "wait_for_report",
            "Wait until a scan report is available, polling with a deadline",
            vec![
                ParamSpec::required("hash", ParamKind::Str),
                ParamSpec::with_default("interval_ms", ParamKind::Int, json!(3000)),
                ParamSpec::with_default("timeout_ms", ParamKind::Int, json!(60000)),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "get_scan_status",
            "Check once whether a scan report is ready",
            vec![ParamSpec::required("hash", ParamKind::Str)],
        ));
        catalog.register(ToolDescriptor::new(
            "get_scan_metadata",
            "Fetch a fixed metadata projection of the scan report",
            vec![ParamSpec::required("hash", ParamKind::Str)],
        ));
        catalog.register(ToolDescriptor::new(
            "get_scan_artifacts",
            "Project selected top-level sections from the scan report",
            vec![
                ParamSpec::required("hash", ParamKind::Str),
                ParamSpec::with_default(
                    "sections",
                    ParamKind::StrList,
                    json!(DEFAULT_ARTIFACT_SECTIONS),
                ),
            ],
        ));
        catalog.register(ToolDescriptor::new(
            "pipeline_scan",
            "Upload, scan, wait for the report, and project its results",
            vec![
                ParamSpec::required("file_path", ParamKind::Str),
                ParamSpec::with_default("scan_type", ParamKind::Enum(SCAN_TYPES), json!("apk")),
                ParamSpec::with_default(
                    "sections",
                    ParamKind::StrList,
                    json!(DEFAULT_ARTIFACT_SECTIONS),
                ),
                ParamSpec::with_default("fetch_pdf", ParamKind::Bool, json!(false)),
                ParamSpec::with_default("output_path", ParamKind::Str, json!("./mobsf_report.pdf")),
                ParamSpec::with_default("interval_ms", ParamKind::Int, json!(3000)),
                ParamSpec::with_default("timeout_ms", ParamKind::Int, json!(60000)),
            ],
        ));

        catalog
    }
}

impl fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCatalog")
            .field("tools", &self.order.len())
            .finish()
    }
}
