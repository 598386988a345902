use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Structured error body for failures that happen outside the JSON-RPC envelope.
///
/// RPC-level failures travel inside `{jsonrpc, id, error}`; this body is only
/// used when the adapter itself could not produce an envelope (for example the
/// subprocess bridge returned garbage).
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "bridge_failed")
    pub error: String,
    /// Human/agent-readable description of what went wrong
    pub message: String,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the operator can check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

impl ApiError {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            request_id: Uuid::now_v7().to_string(),
            docs_hint: None,
        }
    }

    pub fn with_docs_hint(mut self, hint: impl Into<String>) -> Self {
        self.docs_hint = Some(hint.into());
        self
    }
}

/// Error codes used across the HTTP surface
pub mod codes {
    pub const BRIDGE_FAILED: &str = "bridge_failed";
}
