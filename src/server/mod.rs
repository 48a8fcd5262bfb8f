//! Line-delimited JSON-RPC 2.0 server over stdin/stdout.
//!
//! Exposes methods: assess, score_control, families.

use crate::evidence::evidence_from_value;
use crate::ScoringEngine;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC request
#[derive(Debug, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<serde_json::Value>,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Method definition for methods/list
#[derive(Debug, Serialize)]
struct MethodDef {
    name: &'static str,
    description: &'static str,
}

const METHODS: &[MethodDef] = &[
    MethodDef {
        name: "assess",
        description: "Score evidence by control family and return the assessment report",
    },
    MethodDef {
        name: "score_control",
        description: "Score one control from base_score and enhancement tier",
    },
    MethodDef {
        name: "families",
        description: "List the control family registry, multipliers and maturity bands",
    },
];

#[derive(Debug, Deserialize)]
struct ScoreControlParams {
    base_score: f64,
    enhancement: String,
}

/// Handle a single JSON-RPC request and return a response.
pub fn handle_request(engine: &ScoringEngine, req: &JsonRpcRequest) -> JsonRpcResponse {
    let id = req.id.clone();
    match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "serverInfo": { "name": "auditpilot", "version": env!("CARGO_PKG_VERSION") }
            }),
        ),
        "methods/list" => JsonRpcResponse::success(id, serde_json::json!({ "methods": METHODS })),
        "assess" => {
            let params = req.params.clone().unwrap_or(serde_json::Value::Null);
            match evidence_from_value(params) {
                Ok(evidence) => to_response(id, &engine.assess(&evidence)),
                Err(e) => error_response(id, &e),
            }
        }
        "score_control" => {
            let params = req.params.clone().unwrap_or(serde_json::Value::Null);
            match serde_json::from_value::<ScoreControlParams>(params) {
                Ok(p) => to_response(id, &engine.score_control(p.base_score, &p.enhancement)),
                Err(e) => {
                    JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Invalid input: {}", e))
                }
            }
        }
        "families" => to_response(id, engine.tables()),
        other => {
            JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Unknown method: {}", other))
        }
    }
}

fn error_response(
    id: Option<serde_json::Value>,
    error: &crate::Error,
) -> JsonRpcResponse {
    let code = if error.is_bad_input() {
        INVALID_PARAMS
    } else {
        INTERNAL_ERROR
    };
    JsonRpcResponse::failure(id, code, error.to_string())
}

fn to_response<T: Serialize + ?Sized>(
    id: Option<serde_json::Value>,
    value: &T,
) -> JsonRpcResponse {
    match serde_json::to_value(value) {
        Ok(v) => JsonRpcResponse::success(id, v),
        Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
    }
}

/// Handle one raw input line. Blank lines produce no response.
pub fn handle_line(engine: &ScoringEngine, line: &str) -> Option<JsonRpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonRpcRequest>(line) {
        Ok(req) => {
            tracing::debug!(method = req.method.as_str(), "handling request");
            Some(handle_request(engine, &req))
        }
        Err(e) => Some(JsonRpcResponse::failure(
            None,
            PARSE_ERROR,
            format!("Parse error: {}", e),
        )),
    }
}

/// Run the server loop (stdin / stdout) until stdin closes.
pub fn run_server(engine: &ScoringEngine) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());

    tracing::info!("serving JSON-RPC on stdio");
    for line in reader.lines() {
        let line = line?;
        if let Some(response) = handle_line(engine, &line) {
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
