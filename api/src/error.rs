use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use recollect_core::error::{self, ApiError};
use recollect_mcp_runtime::BridgeError;

/// Failures that prevent the adapter from producing a JSON-RPC envelope at all.
#[derive(Debug)]
pub enum AppError {
    /// The tool-server subprocess could not be run or answered garbage (502)
    Bridge(BridgeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, api_error) = match self {
            AppError::Bridge(err) => {
                tracing::error!(error = %err, "subprocess bridge failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError::new(error::codes::BRIDGE_FAILED, err.to_string()).with_docs_hint(
                        "Check RECOLLECT_BRIDGE_COMMAND / RECOLLECT_BRIDGE_ARGS and that the \
                         tool server prints one JSON envelope as its last stdout line.",
                    ),
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<BridgeError> for AppError {
    fn from(err: BridgeError) -> Self {
        AppError::Bridge(err)
    }
}
