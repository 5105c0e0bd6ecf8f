//! Sequential MCP transport: JSON-RPC 2.0 over stdin/stdout.
//!
//! One logical channel per process lifetime. Requests arrive one per line,
//! responses leave one per line, strictly in order — response N always
//! answers request N. Also hosts the script runner, which replays a JSON
//! file of steps through the same dispatch path.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use gb_engine::Engine;

use crate::dispatch::{Dispatcher, ResponseBody};
use crate::error::{DispatchError, code};

/// A JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: JsonValue,
    pub id: JsonValue,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: JsonValue,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcResponse {
    #[must_use]
    pub fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    #[must_use]
    pub fn error(id: JsonValue, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError { code, message }),
            id,
        }
    }

    /// Wrap a dispatch outcome for the wire.
    #[must_use]
    pub fn from_dispatch(id: JsonValue, outcome: Result<ResponseBody, DispatchError>) -> Self {
        match outcome {
            Ok(body) => match serde_json::to_value(&body) {
                Ok(value) => Self::success(id, value),
                Err(e) => Self::error(id, code::SERVER_ERROR, format!("serialize failed: {e}")),
            },
            Err(e) => Self::error(id, e.wire_code(), e.to_string()),
        }
    }

    /// Serialize for a line-framed channel. Serialization of these types
    /// cannot fail in practice; fall back to a bare parse error object so
    /// the channel never goes silent.
    #[must_use]
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"jsonrpc\":\"2.0\",\"error\":{{\"code\":{},\"message\":\"serialize failed\"}},\"id\":null}}",
                code::SERVER_ERROR
            )
        })
    }
}

/// Sequential transport host: the single-shot command surface.
pub struct McpServer<E: Engine> {
    dispatcher: Arc<Mutex<Dispatcher<E>>>,
}

impl<E: Engine> McpServer<E> {
    #[must_use]
    pub fn new(dispatcher: Arc<Mutex<Dispatcher<E>>>) -> Self {
        Self { dispatcher }
    }

    /// Run the server loop: read JSON-RPC from stdin, write responses to
    /// stdout. Returns when stdin closes.
    pub fn run(&self) {
        let stdin = io::stdin();
        let stdout = io::stdout();
        if let Err(e) = self.serve(stdin.lock(), stdout.lock()) {
            error!("stdio channel failed: {e}");
        }
    }

    /// Serve one channel from any reader/writer pair. Parse failures
    /// produce error responses and keep the channel alive; only a dead
    /// writer ends the loop.
    pub fn serve<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> io::Result<()> {
        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = self.handle_line(line);
            writeln!(writer, "{}", response.to_line())?;
            writer.flush()?;
        }

        Ok(())
    }

    /// Handle a single framed request line.
    #[must_use]
    pub fn handle_line(&self, line: &str) -> RpcResponse {
        let request: RpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return RpcResponse::error(
                    JsonValue::Null,
                    code::PARSE_ERROR,
                    format!("parse error: {e}"),
                );
            }
        };

        if request.jsonrpc != "2.0" {
            return RpcResponse::error(
                request.id,
                code::INVALID_REQUEST,
                "invalid JSON-RPC version".to_string(),
            );
        }

        debug!("dispatching {}", request.method);
        let outcome = self
            .dispatcher
            .lock()
            .expect("dispatcher lock poisoned")
            .dispatch_named(&request.method, &request.params);
        RpcResponse::from_dispatch(request.id, outcome)
    }

    /// Run a script file: a JSON array of steps dispatched in order, with
    /// responses written one per line. A step's `save_path` writes the
    /// decoded image payload to disk as a side channel for batch captures.
    pub fn run_script<W: Write>(&self, path: &Path, mut writer: W) -> io::Result<()> {
        let data = std::fs::read_to_string(path)?;
        let steps: Vec<ScriptStep> = serde_json::from_str(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        for (i, step) in steps.iter().enumerate() {
            let id = JsonValue::from(i as u64 + 1);
            let params = step
                .params
                .clone()
                .unwrap_or_else(|| JsonValue::Object(serde_json::Map::new()));

            let outcome = self
                .dispatcher
                .lock()
                .expect("dispatcher lock poisoned")
                .dispatch_named(&step.method, &params);
            let response = RpcResponse::from_dispatch(id, outcome);

            writeln!(writer, "{}", response.to_line())?;
            writer.flush()?;

            if let Some(save_path) = params.get("save_path").and_then(JsonValue::as_str) {
                match response.result.as_ref().and_then(first_image_payload) {
                    Some(payload) => {
                        if let Err(e) = save_payload(Path::new(save_path), payload) {
                            warn!("failed to save {save_path}: {e}");
                        } else {
                            debug!("saved {save_path}");
                        }
                    }
                    None => warn!("step {} produced no image to save", i + 1),
                }
            }
        }

        Ok(())
    }
}

/// A single step in a script file.
#[derive(Debug, Deserialize)]
struct ScriptStep {
    method: String,
    #[serde(default)]
    params: Option<JsonValue>,
}

/// Extract the first image payload from a success envelope.
fn first_image_payload(result: &JsonValue) -> Option<&str> {
    result
        .get("content")?
        .as_array()?
        .iter()
        .find(|item| item.get("type").and_then(JsonValue::as_str) == Some("image"))?
        .get("payload")?
        .as_str()
}

/// Decode a base64 image payload and write it to a file.
fn save_payload(path: &Path, payload: &str) -> io::Result<()> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use gb_engine::SimpleEngine;

    use crate::roms::RomDir;
    use crate::service::ControlService;

    fn server_with_rom(name: &str) -> (McpServer<SimpleEngine>, PathBuf) {
        let dir = std::env::temp_dir().join(format!("gb-mcp-mcp-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        fs::write(dir.join("demo.gb"), [3u8, 1, 4, 1]).expect("write rom");

        let dispatcher = Dispatcher::new(
            ControlService::new(SimpleEngine::new()),
            RomDir::new(&dir),
        );
        (McpServer::new(Arc::new(Mutex::new(dispatcher))), dir)
    }

    #[test]
    fn serve_answers_in_order() {
        let (server, dir) = server_with_rom("order");
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"is_rom_loaded","params":{},"id":1}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"load_rom","params":{"path":"demo.gb"},"id":2}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"screenshot","params":{},"id":3}"#,
            "\n",
        );
        let mut output = Vec::new();

        server.serve(input.as_bytes(), &mut output).expect("serve");

        let lines: Vec<JsonValue> = String::from_utf8(output)
            .expect("utf8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line["id"], JsonValue::from(i as u64 + 1));
            assert!(line.get("error").is_none(), "unexpected error: {line}");
        }
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_line_yields_parse_error_and_keeps_channel() {
        let (server, dir) = server_with_rom("parse");
        let input = concat!(
            "this is not json\n",
            r#"{"jsonrpc":"2.0","method":"is_rom_loaded","params":{},"id":7}"#,
            "\n",
        );
        let mut output = Vec::new();

        server.serve(input.as_bytes(), &mut output).expect("serve");

        let text = String::from_utf8(output).expect("utf8");
        let lines: Vec<JsonValue> = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["code"], JsonValue::from(code::PARSE_ERROR));
        assert_eq!(lines[1]["id"], JsonValue::from(7));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn wrong_version_is_invalid_request() {
        let (server, dir) = server_with_rom("version");
        let response =
            server.handle_line(r#"{"jsonrpc":"1.0","method":"is_rom_loaded","id":1}"#);
        assert_eq!(
            response.error.as_ref().map(|e| e.code),
            Some(code::INVALID_REQUEST)
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unknown_method_maps_to_unknown_command_code() {
        let (server, dir) = server_with_rom("unknown");
        let response =
            server.handle_line(r#"{"jsonrpc":"2.0","method":"warp_speed","params":{},"id":1}"#);
        assert_eq!(
            response.error.as_ref().map(|e| e.code),
            Some(code::UNKNOWN_COMMAND)
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn script_runs_steps_and_saves_captures() {
        let (server, dir) = server_with_rom("script");
        let capture_path = dir.join("out.png");
        let script = serde_json::json!([
            {"method": "load_rom", "params": {"path": "demo.gb"}},
            {"method": "press_start", "params": {"duration_frames": 2}},
            {"method": "screenshot", "params": {"save_path": capture_path.display().to_string()}},
        ]);
        let script_path = dir.join("steps.json");
        fs::write(&script_path, script.to_string()).expect("write script");

        let mut output = Vec::new();
        server.run_script(&script_path, &mut output).expect("script");

        let text = String::from_utf8(output).expect("utf8");
        assert_eq!(text.lines().count(), 3);
        let saved = fs::read(&capture_path).expect("saved capture");
        assert_eq!(&saved[..4], &[0x89, b'P', b'N', b'G']);
        let _ = fs::remove_dir_all(dir);
    }
}
