//! Axum HTTP handlers for the web server
//!
//! Provides the SSE event stream, the message submission endpoint, and a health check.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::mcp::server::{handle_json_rpc_payload, is_json_rpc_message};
use crate::AppState;

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages/";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub session_id: Option<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Opens an SSE session: an `endpoint` event first, then one `message` event per response.
pub async fn sse_endpoint(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (guard, receiver) = state.sessions.open();
    let endpoint = format!("{MESSAGES_PATH}?session_id={}", guard.id().simple());

    let messages = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
        let message = receiver.recv().await?;
        let event = Event::default().event("message").data(message.to_string());
        Some((Ok(event), (receiver, guard)))
    });

    let events = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    })
    .chain(messages);

    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn post_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let Some(raw_session_id) = query.session_id else {
        return Err(AppError::bad_request(
            "missing_session_id",
            "session_id is required",
        ));
    };

    let session_id = Uuid::parse_str(&raw_session_id)
        .map_err(|_| AppError::bad_request("invalid_session_id", "Invalid session ID"))?;

    let Some(sender) = state.sessions.sender(&session_id) else {
        warn!(session_id = %raw_session_id, "message for unknown session");
        return Err(AppError::not_found(
            "session_not_found",
            "Could not find session",
        ));
    };

    let payload = serde_json::from_slice::<Value>(&body)
        .ok()
        .filter(is_json_rpc_message)
        .ok_or_else(|| AppError::bad_request("invalid_message", "Could not parse message"))?;

    if let Some(response) = handle_json_rpc_payload(state.tool_host.as_ref(), payload).await {
        sender
            .send(response)
            .await
            .map_err(|_| AppError::internal(format!("sse session {raw_session_id} closed")))?;
    } else {
        debug!(session_id = %raw_session_id, "message required no response");
    }

    Ok((StatusCode::ACCEPTED, "Accepted").into_response())
}
