//! Tool invocation: check the required arguments, append the arguments to the
//! store as sent and render the text payload the agent reads back.
//!
//! Optional arguments are never validated. Echoed values fall back to a
//! placeholder when absent or empty (`null`, `false`, `0`, `""`).

use recollect_core::records::{SearchScope, ToolArguments};
use serde_json::{Value, json};

use crate::catalog::{CREATE_TASK, SAVE_USER_PROFILE, SEARCH_MEMORY, SET_PREFERENCE};
use crate::store::MemoryStore;

/// A tool call that could not be carried out. Surfaces as JSON-RPC `-32603`.
#[derive(Debug, thiserror::Error)]
pub enum ToolFault {
    #[error("missing required argument '{field}' for {tool}")]
    MissingArgument {
        tool: &'static str,
        field: &'static str,
    },
    #[error("argument '{field}' for {tool} must be a string, got {found}")]
    NotAString {
        tool: &'static str,
        field: &'static str,
        found: Value,
    },
    #[error("invalid arguments for search_memory: {0}")]
    InvalidScope(String),
    #[error("failed to render {tool} result: {source}")]
    Render {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome of resolving a tool name.
#[derive(Debug, PartialEq, Eq)]
pub enum ToolOutcome {
    /// A known tool ran; the text is pretty-printed JSON.
    Completed(String),
    /// The name matched nothing in the catalog. Still a successful call.
    UnknownTool(String),
}

impl ToolOutcome {
    pub fn into_text(self) -> String {
        match self {
            ToolOutcome::Completed(text) => text,
            ToolOutcome::UnknownTool(name) => format!("Unknown tool: {name}"),
        }
    }
}

pub fn invoke_tool(
    store: &MemoryStore,
    name: &str,
    args: ToolArguments,
) -> Result<ToolOutcome, ToolFault> {
    let text = match name {
        SAVE_USER_PROFILE => save_user_profile(store, args)?,
        SET_PREFERENCE => set_preference(store, args)?,
        CREATE_TASK => create_task(store, args)?,
        SEARCH_MEMORY => search_memory(store, args)?,
        other => return Ok(ToolOutcome::UnknownTool(other.to_string())),
    };
    Ok(ToolOutcome::Completed(text))
}

/// Required arguments must be present and non-null; their type is not checked.
fn require<'a>(
    tool: &'static str,
    args: &'a ToolArguments,
    field: &'static str,
) -> Result<&'a Value, ToolFault> {
    match args.get(field) {
        None | Some(Value::Null) => Err(ToolFault::MissingArgument { tool, field }),
        Some(value) => Ok(value),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn or_placeholder(value: Option<&Value>, placeholder: Value) -> Value {
    match value {
        Some(v) if !is_empty_value(v) => v.clone(),
        _ => placeholder,
    }
}

/// Strings verbatim, anything else as compact JSON.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render(tool: &'static str, payload: &Value) -> Result<String, ToolFault> {
    serde_json::to_string_pretty(payload).map_err(|source| ToolFault::Render { tool, source })
}

fn save_user_profile(store: &MemoryStore, args: ToolArguments) -> Result<String, ToolFault> {
    let name = require(SAVE_USER_PROFILE, &args, "name")?.clone();
    let profile = store.save_profile(args);
    let f = &profile.fields;

    tracing::info!(tool = SAVE_USER_PROFILE, name = %as_text(&name), "profile saved");

    render(
        SAVE_USER_PROFILE,
        &json!({
            "success": true,
            "message": format!("Profile saved for {}", as_text(&name)),
            "parameters": {
                "required_extracted": { "name": name },
                "optional_extracted": {
                    "age": or_placeholder(f.get("age"), json!("not provided")),
                    "email": or_placeholder(f.get("email"), json!("not provided")),
                    "location": or_placeholder(f.get("location"), json!("not provided")),
                    "interests": or_placeholder(f.get("interests"), json!([])),
                }
            }
        }),
    )
}

fn set_preference(store: &MemoryStore, args: ToolArguments) -> Result<String, ToolFault> {
    let key = require(SET_PREFERENCE, &args, "key")?.clone();
    let value = require(SET_PREFERENCE, &args, "value")?.clone();
    let preference = store.set_preference(args);

    tracing::info!(tool = SET_PREFERENCE, key = %as_text(&key), "preference stored");

    render(
        SET_PREFERENCE,
        &json!({
            "success": true,
            "message": format!("{} = {}", as_text(&key), as_text(&value)),
            "parameters": {
                "key": key,
                "value": value,
                "category": or_placeholder(preference.fields.get("category"), json!("default")),
            }
        }),
    )
}

fn create_task(store: &MemoryStore, args: ToolArguments) -> Result<String, ToolFault> {
    let title = require(CREATE_TASK, &args, "title")?.clone();
    let task = store.create_task(args);
    let f = &task.fields;

    tracing::info!(tool = CREATE_TASK, task_id = task.id, "task created");

    render(
        CREATE_TASK,
        &json!({
            "success": true,
            "message": format!("Task created: \"{}\"", as_text(&title)),
            "taskId": task.id,
            "parameters": {
                "required": { "title": title },
                "optional": {
                    "description": or_placeholder(f.get("description"), json!("none")),
                    "priority": or_placeholder(f.get("priority"), json!("not set")),
                    "due_date": or_placeholder(f.get("due_date"), json!("no deadline")),
                    "tags": or_placeholder(f.get("tags"), json!([])),
                }
            }
        }),
    )
}

fn search_scope(args: &ToolArguments) -> Result<SearchScope, ToolFault> {
    match args.get("type") {
        None => Ok(SearchScope::default()),
        Some(v) if is_empty_value(v) => Ok(SearchScope::default()),
        Some(Value::String(raw)) => raw.parse().map_err(ToolFault::InvalidScope),
        Some(other) => Err(ToolFault::InvalidScope(format!(
            "search type must be a string, got {other}"
        ))),
    }
}

fn search_memory(store: &MemoryStore, args: ToolArguments) -> Result<String, ToolFault> {
    let query = match require(SEARCH_MEMORY, &args, "query")? {
        Value::String(query) => query.clone(),
        other => {
            return Err(ToolFault::NotAString {
                tool: SEARCH_MEMORY,
                field: "query",
                found: other.clone(),
            });
        }
    };
    let scope = search_scope(&args)?;

    let results = store.search(&query, scope);
    tracing::info!(
        tool = SEARCH_MEMORY,
        scope = %scope,
        found = results.len(),
        "memory searched"
    );

    render(
        SEARCH_MEMORY,
        &json!({
            "success": true,
            "message": format!("Found {} matching record(s)", results.len()),
            "query": query,
            "type": scope.as_str(),
            "found": results.len(),
            "results": results,
        }),
    )
}
