//! # MobSF MCP adapter
//!
//! A tool adapter for the Mobile Security Framework (MobSF) REST API:
//! it exposes a fixed catalog of named tools over a `{name, arguments}`
//! call envelope, validates each call, forwards the work to a MobSF
//! server, and resolves every invocation to a uniform success-or-failure
//! result.
//!
//! ## Features
//!
//! - **Tool Catalog**: declarative descriptors with typed parameter
//!   schemas, defaults, and enumerated value sets
//! - **Dispatcher**: every call terminates in a structured result,
//!   unknown tools, bad arguments, and upstream failures included
//! - **Report polling**: an explicit state machine waits for scan
//!   reports with retryable-status classification and a hard deadline
//! - **Substitutable client**: the MobSF exchange sits behind a trait,
//!   so the core is testable without a server
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use mobsf_mcp::{CallRequest, Dispatcher, HttpScanService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::new("http://127.0.0.1:8000", "my-api-key")?;
//!     let service = Arc::new(HttpScanService::new(&config)?);
//!     let dispatcher = Dispatcher::with_standard_catalog(service);
//!
//!     let result = dispatcher
//!         .invoke(CallRequest::new(
//!             "get_scan_status",
//!             serde_json::json!({"hash": "0a1b2c"}),
//!         ))
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod tool;

// Re-exports for convenient usage
pub use config::{ConfigError, DEFAULT_BASE_URL, ServiceConfig};
pub use error::{ErrorKind, ToolError};
pub use service::{HttpScanService, ScanService, ServiceError};
pub use tool::{
    CallRequest, CallResult, Dispatcher, ParamKind, ParamSpec, ToolCatalog, ToolDescriptor,
};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::config::ServiceConfig;
    pub use crate::error::{ErrorKind, ToolError};
    pub use crate::service::{HttpScanService, ScanService};
    pub use crate::tool::{CallRequest, CallResult, Dispatcher, ToolCatalog};
}
