//! `mobsf-mcp` binary: serves the tool catalog over line-delimited JSON
//! on stdio, or prints the catalog.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mobsf_mcp::{
    CallRequest, CallResult, Dispatcher, ErrorKind, HttpScanService, ServiceConfig, ToolCatalog,
};

#[derive(Debug, Parser)]
#[command(name = "mobsf-mcp", about = "MobSF tool adapter")]
struct Cli {
    /// MobSF server base URL.
    #[arg(long, env = "MOBSF_URL", default_value = mobsf_mcp::DEFAULT_BASE_URL)]
    base_url: String,

    /// MobSF REST API key. Required to serve.
    #[arg(long, env = "MOBSF_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve tool calls over stdio (default).
    Serve,
    /// Print the tool catalog and exit.
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Tools => {
            print_catalog(&ToolCatalog::standard());
            Ok(())
        }
        Command::Serve => {
            let config = ServiceConfig::new(cli.base_url, cli.api_key.unwrap_or_default())
                .context("invalid configuration")?;
            let service =
                Arc::new(HttpScanService::new(&config).context("failed to build MobSF client")?);
            let dispatcher = Dispatcher::with_standard_catalog(service);
            info!(base_url = config.base_url(), tools = dispatcher.catalog().len(), "serving");
            serve(dispatcher).await
        }
    }
}

fn print_catalog(catalog: &ToolCatalog) {
    for descriptor in catalog.list() {
        println!("{}\n    {}", descriptor.signature(), descriptor.description);
    }
}

/// Reads `{name, arguments}` requests line by line and replies with one
/// serialized result per line. Malformed request JSON gets a rendered
/// validation failure, not a dropped line.
async fn serve(dispatcher: Dispatcher) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<CallRequest>(line) {
            Ok(request) => dispatcher.invoke(request).await,
            Err(error) => CallResult::failure(
                ErrorKind::Validation,
                format!("Invalid request: {}", error),
            ),
        };

        let rendered = serde_json::to_string(&result)?;
        stdout.write_all(rendered.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
