use anyhow::Result;
use serde_json::json;
use std::io::{BufRead, Write};
use tracing::debug;

use super::protocol::*;
use super::{resources, tools, ServerContext};

/// Serve line-delimited JSON-RPC until `input` closes.
pub fn run(input: impl BufRead, mut output: impl Write, ctx: &ServerContext) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let resp = JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}"));
                send(&mut output, &resp)?;
                continue;
            }
        };
        debug!(method = request.method.as_str(), "request");

        if let Some(resp) = dispatch(&request, ctx) {
            send(&mut output, &resp)?;
        }
    }

    Ok(())
}

fn send(out: &mut impl Write, response: &JsonRpcResponse) -> Result<()> {
    let json = serde_json::to_string(response)?;
    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}

fn dispatch(request: &JsonRpcRequest, ctx: &ServerContext) -> Option<JsonRpcResponse> {
    // Notifications never get a reply, known method or not.
    let Some(id) = request.id.clone() else {
        debug!(method = request.method.as_str(), "notification ignored");
        return None;
    };
    let id = Some(id);
    match request.method.as_str() {
        "initialize" => Some(JsonRpcResponse::from_result(id, &initialize_result())),
        "ping" => Some(JsonRpcResponse::success(id, json!({}))),
        "tools/list" => Some(JsonRpcResponse::success(id, json!({ "tools": tools::list_tools() }))),
        "tools/call" => {
            let name = request.param_str("name").unwrap_or("");
            let args = request.params.get("arguments").cloned().unwrap_or(json!({}));
            let result = tools::call_tool(name, &args, ctx);
            Some(JsonRpcResponse::from_result(id, &result))
        }
        "resources/list" => Some(JsonRpcResponse::success(
            id,
            json!({ "resources": resources::list_resources() }),
        )),
        "resources/read" => {
            let uri = request.param_str("uri").unwrap_or("");
            Some(match resources::read_resource(uri, ctx) {
                Ok(contents) => JsonRpcResponse::success(id, json!({ "contents": contents })),
                Err(e) => JsonRpcResponse::error(id, INVALID_PARAMS, e),
            })
        }
        _ => Some(JsonRpcResponse::error(
            id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        )),
    }
}

fn initialize_result() -> InitializeResult {
    InitializeResult {
        protocol_version: "2024-11-05".into(),
        capabilities: ServerCapabilities {
            tools: Capability::default(),
            resources: Capability::default(),
        },
        server_info: ServerInfo {
            name: "reelmatch".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        },
    }
}
