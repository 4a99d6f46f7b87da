//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! Stdout carries protocol frames only; all logging goes to stderr.

use std::io::{self, BufRead, BufReader, Write};

use tracing::{debug, error, warn};

use crate::server::McpServer;

use super::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

pub struct StdioTransport;

impl StdioTransport {
    pub fn new() -> Self {
        Self
    }

    /// Drive the server until stdin closes.
    pub fn run(self, mut server: McpServer) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let reader = BufReader::new(stdin.lock());
        let mut stdout = stdout.lock();

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    error!(error = %e, "stdin read failed");
                    break;
                }
            };
            if line.is_empty() {
                continue;
            }
            debug!(bytes = line.len(), "request received");

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "unparseable request");
                    write_response(
                        &mut stdout,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    )?;
                    continue;
                }
            };

            if let Some(response) = server.handle_request(request) {
                write_response(&mut stdout, &response)?;
            }
        }
        Ok(())
    }
}

fn write_response(stdout: &mut impl Write, response: &JsonRpcResponse) -> io::Result<()> {
    match serde_json::to_string(response) {
        Ok(json) => {
            debug!(bytes = json.len(), "response sent");
            writeln!(stdout, "{json}")?;
        }
        Err(e) => {
            error!(error = %e, "response serialization failed");
            // A minimal frame keeps the client from hanging.
            writeln!(
                stdout,
                r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":-32603,"message":"internal error"}}}}"#
            )?;
        }
    }
    stdout.flush()
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}
