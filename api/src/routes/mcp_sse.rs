use std::convert::Infallible;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use recollect_mcp_runtime::{ReplyTo, RpcError, error_response, response_error_code};
use serde_json::Value;
use tokio_stream::{Stream, StreamExt};

use crate::error::AppError;
use crate::state::AppState;

const SSE_PATH: &str = "/sse";
const MESSAGE_PATH: &str = "/message";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(SSE_PATH, get(sse_handshake))
        .route(MESSAGE_PATH, post(message_post))
}

/// Advertise the message endpoint, then hold the stream open.
///
/// The agent connects here first and posts JSON-RPC envelopes to the URL it
/// receives in the `endpoint` event.
async fn sse_handshake(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let base = state
        .public_base_url
        .clone()
        .unwrap_or_else(|| request_base_url(&headers, &state.fallback_base_url));
    let endpoint = format!("{base}{MESSAGE_PATH}");

    tracing::info!(
        event = "sse_connection_established",
        endpoint = %endpoint,
        user_agent = ?header_value(&headers, "user-agent"),
        "SSE connection established"
    );

    let advert = tokio_stream::once(Ok(Event::default().event("endpoint").data(endpoint)));
    let stream = advert.chain(tokio_stream::pending());

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn message_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let incoming: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, "message body is not JSON");
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(error_response(&ReplyTo::detached(), RpcError::parse_error())),
            )
                .into_response());
        }
    };

    tracing::info!(
        event = "mcp_request",
        method = ?incoming.get("method"),
        params = ?incoming.get("params"),
        call_id = ?header_value(&headers, "x-call-id"),
        chat_id = ?header_value(&headers, "x-chat-id"),
        backend = %state.backend.kind(),
        "request from agent"
    );

    let response = state.backend.handle(incoming).await?;
    let status = status_for(&response);

    tracing::info!(
        event = "mcp_response",
        status = status.as_u16(),
        response = %response,
        "response to agent"
    );

    Ok((status, Json(response)).into_response())
}

/// HTTP status mirroring the envelope: 500 for internal faults, 400 for other
/// RPC errors, 200 for results (including unknown-tool results).
fn status_for(response: &Value) -> StatusCode {
    match response_error_code(response) {
        None => StatusCode::OK,
        Some(RpcError::INTERNAL_ERROR) => StatusCode::INTERNAL_SERVER_ERROR,
        Some(_) => StatusCode::BAD_REQUEST,
    }
}

fn request_base_url(headers: &HeaderMap, fallback: &str) -> String {
    let forwarded_proto = first_header_token(headers, "x-forwarded-proto");
    let forwarded_host = first_header_token(headers, "x-forwarded-host");
    let host = forwarded_host.or_else(|| header_value(headers, HOST.as_str()));

    match host {
        Some(host) => {
            let proto = forwarded_proto.unwrap_or_else(|| "http".to_string());
            format!("{}://{}", proto.trim_end_matches(':'), host)
        }
        None => fallback.to_string(),
    }
}

fn header_value(headers: &HeaderMap, key: &str) -> Option<String> {
    headers
        .get(key)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

fn first_header_token(headers: &HeaderMap, key: &str) -> Option<String> {
    headers
        .get(key)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}
