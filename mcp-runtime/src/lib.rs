//! JSON-RPC dispatch core for the recollect MCP server.
//!
//! [`Dispatcher`] turns one request envelope into one response envelope:
//!
//! - `initialize` returns the handshake descriptor,
//! - `tools/list` returns the static [`catalog`],
//! - `tools/call` runs a tool against the shared [`store::MemoryStore`],
//! - anything else is `-32601 Method not found`.
//!
//! **Unknown tool names are not RPC errors.** `tools/call` with a name outside
//! the catalog answers with a normal `result` whose text is
//! `"Unknown tool: <name>"`. Agents have to read the payload to notice.
//!
//! Argument faults (missing required field, wrong JSON type) are reported as
//! `-32603` with the fault description as the message.

use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub mod backend;
pub mod bridge;
pub mod catalog;
pub mod store;
pub mod tools;

pub use backend::{Backend, BackendKind};
pub use bridge::{BridgeError, SubprocessBridge};
pub use store::MemoryStore;

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const MCP_SERVER_NAME: &str = "recollect-mcp";
const DEFAULT_JSONRPC: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub fn parse_error() -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: "Parse error".to_string(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {method}"),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: Self::INTERNAL_ERROR,
            message: message.into(),
        }
    }
}

/// The parts of a request that are echoed back on the response.
///
/// `id` is `None` only when the request had no `id` key at all; an explicit
/// `null` is kept as `Some(Value::Null)` so the reply mirrors it exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyTo {
    pub jsonrpc: Value,
    pub id: Option<Value>,
}

impl ReplyTo {
    pub fn from_request(request: &Map<String, Value>) -> Self {
        Self {
            jsonrpc: request
                .get("jsonrpc")
                .cloned()
                .unwrap_or_else(|| Value::String(DEFAULT_JSONRPC.to_string())),
            id: request.get("id").cloned(),
        }
    }

    /// For replies to input that was not a request object at all.
    pub fn detached() -> Self {
        Self {
            jsonrpc: Value::String(DEFAULT_JSONRPC.to_string()),
            id: Some(Value::Null),
        }
    }

    fn envelope(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("jsonrpc".to_string(), self.jsonrpc.clone());
        if let Some(id) = &self.id {
            payload.insert("id".to_string(), id.clone());
        }
        payload
    }
}

pub fn success_response(reply: &ReplyTo, result: Value) -> Value {
    let mut payload = reply.envelope();
    payload.insert("result".to_string(), result);
    Value::Object(payload)
}

pub fn error_response(reply: &ReplyTo, error: RpcError) -> Value {
    let mut payload = reply.envelope();
    payload.insert(
        "error".to_string(),
        json!({
            "code": error.code,
            "message": error.message
        }),
    );
    Value::Object(payload)
}

/// Error code carried by a response envelope, if it is an error envelope.
pub fn response_error_code(response: &Value) -> Option<i64> {
    response
        .get("error")
        .and_then(|error| error.get("code"))
        .and_then(Value::as_i64)
}

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    store: MemoryStore,
}

impl Dispatcher {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn handle_message(&self, incoming: Value) -> Value {
        let Some(obj) = incoming.as_object() else {
            return error_response(
                &ReplyTo::detached(),
                RpcError::invalid_request("Request must be a JSON object"),
            );
        };

        let reply = ReplyTo::from_request(obj);
        let method = match obj.get("method") {
            Some(Value::String(method)) => method.as_str(),
            Some(other) => {
                return error_response(&reply, RpcError::method_not_found(&other.to_string()));
            }
            None => return error_response(&reply, RpcError::method_not_found("(missing)")),
        };

        let params = obj
            .get("params")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        match self.handle_request(method, params) {
            Ok(result) => success_response(&reply, result),
            Err(err) => {
                if err.code == RpcError::INTERNAL_ERROR {
                    tracing::error!(method, code = err.code, message = %err.message, "request failed");
                } else {
                    tracing::warn!(method, code = err.code, message = %err.message, "request rejected");
                }
                error_response(&reply, err)
            }
        }
    }

    fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize_payload()),
            "tools/list" => Ok(catalog::tools_list_payload()),
            "tools/call" => self.handle_tools_call(params),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::internal("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::internal("tools/call requires string field 'name'"))?;

        let args = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(RpcError::internal(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        let arguments = Value::Object(args.clone());
        tracing::info!(tool = name, arguments = %arguments, "tool call received");

        let outcome = tools::invoke_tool(&self.store, name, args)
            .map_err(|fault| RpcError::internal(fault.to_string()))?;
        if let tools::ToolOutcome::UnknownTool(unknown) = &outcome {
            tracing::warn!(tool = %unknown, "unknown tool requested");
        }

        Ok(json!({
            "content": [{ "type": "text", "text": outcome.into_text() }]
        }))
    }
}

fn initialize_payload() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": MCP_SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Serve newline-delimited envelopes: one request per line in, one compact
/// response per line out. Returns at end of input.
pub async fn serve_lines<R, W>(
    dispatcher: &Dispatcher,
    reader: R,
    mut writer: W,
) -> Result<(), std::io::Error>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(incoming) => dispatcher.handle_message(incoming),
            Err(err) => {
                tracing::warn!(error = %err, "discarding unparseable line");
                error_response(&ReplyTo::detached(), RpcError::parse_error())
            }
        };

        let mut body = serde_json::to_vec(&response).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize JSON: {e}"),
            )
        })?;
        body.push(b'\n');
        writer.write_all(&body).await?;
        writer.flush().await?;
    }
    Ok(())
}

pub async fn serve_stdio(dispatcher: &Dispatcher) -> Result<(), std::io::Error> {
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    serve_lines(dispatcher, reader, tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn call(dispatcher: &Dispatcher, name: &str, arguments: Value) -> Value {
        dispatcher.handle_message(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }))
    }

    fn text_payload(response: &Value) -> String {
        response["result"]["content"][0]["text"]
            .as_str()
            .expect("tool call result should carry text content")
            .to_string()
    }

    #[test]
    fn initialize_returns_handshake_descriptor() {
        let dispatcher = Dispatcher::default();
        let response = dispatcher.handle_message(json!({
            "jsonrpc": "2.0",
            "id": "init-1",
            "method": "initialize",
            "params": { "ignored": true }
        }));

        assert_eq!(response["id"], "init-1");
        assert_eq!(response["result"]["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(response["result"]["capabilities"], json!({ "tools": {} }));
        assert_eq!(response["result"]["serverInfo"]["name"], MCP_SERVER_NAME);
    }

    #[test]
    fn tools_list_names_every_tool() {
        let dispatcher = Dispatcher::default();
        let response = dispatcher.handle_message(json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/list"
        }));

        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .expect("tools must be an array")
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec!["save_user_profile", "set_preference", "create_task", "search_memory"]
        );
    }

    #[test]
    fn save_profile_appends_and_echoes_name() {
        let dispatcher = Dispatcher::default();
        let response = call(&dispatcher, "save_user_profile", json!({ "name": "Ada" }));

        assert!(response.get("error").is_none());
        assert!(text_payload(&response).contains("Ada"));

        let snapshot = dispatcher.store().snapshot();
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.users[0].fields["name"], "Ada");
        assert!(!snapshot.users[0].saved_at.is_empty());
    }

    #[test]
    fn sequential_tasks_get_ids_one_and_two() {
        let dispatcher = Dispatcher::default();
        let first = call(&dispatcher, "create_task", json!({ "title": "A" }));
        let second = call(&dispatcher, "create_task", json!({ "title": "B" }));

        let first: Value = serde_json::from_str(&text_payload(&first)).expect("json text");
        let second: Value = serde_json::from_str(&text_payload(&second)).expect("json text");
        assert_eq!(first["taskId"], 1);
        assert_eq!(second["taskId"], 2);
    }

    #[test]
    fn search_scope_excludes_other_collections() {
        let dispatcher = Dispatcher::default();
        call(&dispatcher, "save_user_profile", json!({ "name": "Ada" }));

        let all = call(&dispatcher, "search_memory", json!({ "query": "ada" }));
        let all: Value = serde_json::from_str(&text_payload(&all)).expect("json text");
        assert!(all["found"].as_u64().unwrap_or_default() >= 1);
        assert!(
            all["results"][0]
                .to_string()
                .to_lowercase()
                .contains("ada")
        );

        let tasks = call(
            &dispatcher,
            "search_memory",
            json!({ "query": "ada", "type": "tasks" }),
        );
        let tasks: Value = serde_json::from_str(&text_payload(&tasks)).expect("json text");
        assert_eq!(tasks["found"], 0);
        assert_eq!(tasks["type"], "tasks");
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let dispatcher = Dispatcher::default();
        let response = dispatcher.handle_message(json!({
            "jsonrpc": "2.0", "id": 9, "method": "nonexistent"
        }));

        assert_eq!(response["error"]["code"], -32601);
        assert!(
            response["error"]["message"]
                .as_str()
                .unwrap_or_default()
                .contains("nonexistent")
        );
        assert_eq!(response_error_code(&response), Some(RpcError::METHOD_NOT_FOUND));
        assert!(response.get("result").is_none());
    }

    #[test]
    fn unknown_tool_is_a_successful_response() {
        let dispatcher = Dispatcher::default();
        let response = call(&dispatcher, "launch_rockets", json!({}));

        assert!(response.get("error").is_none());
        assert!(text_payload(&response).contains("Unknown tool: launch_rockets"));
    }

    #[test]
    fn missing_required_argument_is_internal_error() {
        let dispatcher = Dispatcher::default();
        let response = call(&dispatcher, "set_preference", json!({ "key": "color" }));

        assert_eq!(response["error"]["code"], -32603);
        assert!(
            response["error"]["message"]
                .as_str()
                .unwrap_or_default()
                .contains("value")
        );
        assert_eq!(dispatcher.store().counts().preferences, 0);
    }

    #[test]
    fn missing_arguments_object_faults_on_required_field() {
        let dispatcher = Dispatcher::default();
        let response = dispatcher.handle_message(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "create_task" }
        }));
        assert_eq!(response["error"]["code"], -32603);
    }

    #[test]
    fn response_id_mirrors_request_id() {
        let dispatcher = Dispatcher::default();
        for method in ["initialize", "tools/list", "tools/call", "nonexistent"] {
            for id in [json!(42), json!("abc"), Value::Null] {
                let response = dispatcher.handle_message(json!({
                    "jsonrpc": "2.0",
                    "id": id.clone(),
                    "method": method,
                    "params": { "name": "noop", "arguments": {} }
                }));
                assert_eq!(response.get("id"), Some(&id), "method {method}");
            }

            let response = dispatcher.handle_message(json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": { "name": "noop", "arguments": {} }
            }));
            assert!(response.get("id").is_none(), "method {method}");
        }
    }

    #[test]
    fn missing_or_non_string_method_is_method_not_found() {
        let dispatcher = Dispatcher::default();

        let response = dispatcher.handle_message(json!({ "jsonrpc": "2.0", "id": 4, "method": 5 }));
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found: 5");
        assert_eq!(response["id"], 4);

        let response = dispatcher.handle_message(json!({ "jsonrpc": "2.0", "id": 5 }));
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found: (missing)");
    }

    #[test]
    fn tool_call_with_off_schema_arguments_is_stored() {
        let dispatcher = Dispatcher::default();
        let response = call(
            &dispatcher,
            "create_task",
            json!({ "title": "Ship", "priority": "normal" }),
        );
        assert!(response.get("error").is_none());

        let response = call(
            &dispatcher,
            "save_user_profile",
            json!({ "name": "Ada", "age": "thirty six" }),
        );
        assert!(response.get("error").is_none());

        let counts = dispatcher.store().counts();
        assert_eq!(counts.tasks, 1);
        assert_eq!(counts.users, 1);
    }

    #[test]
    fn jsonrpc_defaults_to_two_point_oh() {
        let dispatcher = Dispatcher::default();
        let response = dispatcher.handle_message(json!({ "id": 1, "method": "tools/list" }));
        assert_eq!(response["jsonrpc"], "2.0");
    }

    #[test]
    fn non_object_request_is_invalid() {
        let dispatcher = Dispatcher::default();
        let response = dispatcher.handle_message(json!([1, 2, 3]));
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn serve_lines_answers_each_request_line() {
        let dispatcher = Dispatcher::default();
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n",
            "\n",
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",",
            "\"params\":{\"name\":\"create_task\",\"arguments\":{\"title\":\"A\"}}}\n"
        );
        let mut output = Vec::new();

        serve_lines(&dispatcher, input.as_bytes(), &mut output)
            .await
            .expect("line server should finish at EOF");

        let lines: Vec<Value> = String::from_utf8(output)
            .expect("output should be utf-8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("each output line is JSON"))
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], -32700);
        assert_eq!(lines[2]["id"], 2);
        assert_eq!(dispatcher.store().counts().tasks, 1);
    }
}
