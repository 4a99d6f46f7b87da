//! agrama-mcp — the stdio JSON-RPC entry point.
//!
//! Stdout is the protocol channel; tracing goes to stderr. An optional
//! TOML config path may be passed as the first argument.

mod protocol;
mod server;
mod tools;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use agrama_core::config::EngineConfig;
use agrama_engine::AgramaEngine;

use crate::protocol::StdioTransport;
use crate::server::McpServer;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            toml::from_str(&raw).with_context(|| format!("parsing config {path}"))?
        }
        None => EngineConfig::standard(),
    };

    let engine = Arc::new(AgramaEngine::new(config));
    tracing::info!(version = agrama_core::constants::VERSION, "agrama engine ready");

    let server = McpServer::new(engine);
    StdioTransport::new().run(server)?;
    Ok(())
}
