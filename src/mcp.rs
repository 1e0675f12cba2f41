// DriveGate - MCP Server (JSON-RPC 2.0 over stdio)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Tool calls from the agent runtime arrive here, one JSON object per line.
// Exposes every tool in the registry table. stdout carries protocol only;
// diagnostics go to stderr through the log facade.

use crate::registry;
use crate::session::Session;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "drivegate";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Summarize tool params for logging (truncate large values)
fn param_summary(args: &Value) -> String {
    let path = args
        .get("path")
        .or_else(|| args.get("src_path"))
        .or_else(|| args.get("old_path"))
        .and_then(|v| v.as_str());
    match path {
        Some(p) => {
            let size = args.get("content").and_then(|v| v.as_str()).map(|s| s.len());
            match size {
                Some(len) => format!("path={} content_len={}", p, len),
                None => format!("path={}", p),
            }
        }
        None => {
            let s = args.to_string();
            if s.chars().count() > 300 {
                format!("{}…", s.chars().take(300).collect::<String>())
            } else {
                s
            }
        }
    }
}

fn response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// Handle one decoded JSON-RPC message. `None` for notifications and
/// anything else that needs no reply.
pub fn handle_message(session: &mut Session, msg: &Value) -> Option<Value> {
    let method = msg["method"].as_str().unwrap_or("");
    let id = &msg["id"];
    let params = &msg["params"];

    log::debug!("Received: {}", method);

    match method {
        "initialize" => Some(response(id, json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            }
        }))),

        "notifications/initialized" => None,

        "tools/list" => Some(response(id, json!({ "tools": registry::definitions() }))),

        "tools/call" => {
            let name = params["name"].as_str().unwrap_or("");
            let args = params.get("arguments").cloned().unwrap_or(Value::Null);

            log::info!("CALL {} | {}", name, param_summary(&args));

            let outcome = session.invoke(name, &args);
            let payload = outcome.to_payload();

            Some(response(id, json!({
                "content": [{ "type": "text", "text": payload.to_string() }],
                "structuredContent": payload,
                "isError": outcome.is_failure(),
            })))
        }

        "ping" => Some(response(id, json!({}))),

        _ => {
            if id.is_null() {
                None
            } else {
                Some(error_response(id, -32601, &format!("Unknown method: {}", method)))
            }
        }
    }
}

fn send<W: Write>(out: &mut W, msg: &Value) -> io::Result<()> {
    out.write_all(msg.to_string().as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Serve until the input stream ends. Each line is handled to completion
/// before the next is read.
pub fn serve<R: BufRead, W: Write>(session: &mut Session, input: R, mut output: W) -> io::Result<()> {
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("stdin read error: {}", e);
                continue;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let msg: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                log::error!("JSON parse error: {}", e);
                continue;
            }
        };

        if let Some(reply) = handle_message(session, &msg) {
            send(&mut output, &reply)?;
        }
    }
    Ok(())
}

/// Run the MCP server on stdin/stdout
pub fn run(mut session: Session) -> io::Result<()> {
    log::info!("Starting {} v{}", SERVER_NAME, SERVER_VERSION);
    log::info!("Allowed root: {}", session.tools().root().path().display());
    log::info!("Read ceiling: {} bytes", session.tools().max_read_size());

    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = serve(&mut session, stdin.lock(), stdout.lock());

    session.close();
    result
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::AutoApprove;
    use crate::audit::AuditLog;
    use crate::fs::FileTools;
    use crate::paths::AllowedRoot;
    use tempfile::{tempdir, TempDir};

    fn session() -> (TempDir, Session) {
        let dir = tempdir().unwrap();
        let root = AllowedRoot::new(&dir.path().to_string_lossy()).unwrap();
        let tools = FileTools::new(root, 1024, Box::new(AutoApprove));
        (dir, Session::new(tools, AuditLog::disabled()))
    }

    fn roundtrip(session: &mut Session, lines: &[Value]) -> Vec<Value> {
        let input: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let mut output = Vec::new();
        serve(session, input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn initialize_and_list() {
        let (_dir, mut session) = session();
        let replies = roundtrip(&mut session, &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        ]);

        assert_eq!(replies.len(), 2, "notification must not be answered");
        assert_eq!(replies[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(replies[0]["result"]["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(replies[1]["result"]["tools"].as_array().unwrap().len(), registry::TOOLS.len());
    }

    #[test]
    fn tool_call_returns_payload_as_text() {
        let (dir, mut session) = session();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        let path = dir.path().join("a.txt").to_string_lossy().into_owned();

        let replies = roundtrip(&mut session, &[json!({
            "jsonrpc": "2.0", "id": 7, "method": "tools/call",
            "params": {"name": "read_file", "arguments": {"path": path}},
        })]);

        let result = &replies[0]["result"];
        assert_eq!(replies[0]["id"], 7);
        assert_eq!(result["isError"], false);
        let text: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["content"], "hi");
        assert_eq!(result["structuredContent"]["content"], "hi");
    }

    #[test]
    fn failures_are_results_not_rpc_errors() {
        let (_dir, mut session) = session();
        let replies = roundtrip(&mut session, &[json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "read_file", "arguments": {"path": "/definitely/not/in/root"}},
        })]);

        assert!(replies[0].get("error").is_none());
        assert_eq!(replies[0]["result"]["isError"], true);
        assert_eq!(replies[0]["result"]["structuredContent"]["kind"], "path_outside_allowed_root");
    }

    #[test]
    fn unknown_method_and_garbage() {
        let (_dir, mut session) = session();
        let input = "not json\n\n{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"resources/list\"}\n";
        let mut output = Vec::new();
        serve(&mut session, input.as_bytes(), &mut output).unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 1, "unparseable lines are skipped");
        assert_eq!(replies[0]["error"]["code"], -32601);
        assert_eq!(replies[0]["id"], 9);
    }

    #[test]
    fn summary_hides_content() {
        let summary = param_summary(&json!({"path": "/a", "content": "secret text"}));
        assert_eq!(summary, "path=/a content_len=11");
    }
}
