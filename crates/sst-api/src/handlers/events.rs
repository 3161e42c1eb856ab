//! Alert and inference log endpoints: live SSE streams and JSON snapshots.

use std::convert::Infallible;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::{Stream, StreamExt};
use serde::Deserialize;
use sst_engine::EventBroadcaster;
use sst_models::{Cursor, LogEntry, LogSnapshot};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics::{self, SseStreamGuard};
use crate::state::AppState;

/// `?cursor=N`: first sequence number the client has not seen.
#[derive(Debug, Default, Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<u64>,
}

/// Live alert stream.
pub async fn alert_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<CursorQuery>, QueryRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let cursor = resume_cursor(&headers, query)?;
    open_stream("alerts", &state.alerts, cursor, &state)
}

/// Live inference summary stream.
pub async fn inference_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<CursorQuery>, QueryRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let cursor = resume_cursor(&headers, query)?;
    open_stream("inference", &state.inferences, cursor, &state)
}

/// Alert log entries from `cursor`.
pub async fn alert_snapshot(
    State(state): State<AppState>,
    query: Result<Query<CursorQuery>, QueryRejection>,
) -> ApiResult<Json<LogSnapshot>> {
    let cursor = query_cursor(query)?.unwrap_or(Cursor::START);
    Ok(Json(state.alerts.log().snapshot_from(cursor)))
}

/// Inference log entries from `cursor`.
pub async fn inference_snapshot(
    State(state): State<AppState>,
    query: Result<Query<CursorQuery>, QueryRejection>,
) -> ApiResult<Json<LogSnapshot>> {
    let cursor = query_cursor(query)?.unwrap_or(Cursor::START);
    Ok(Json(state.inferences.log().snapshot_from(cursor)))
}

fn query_cursor(query: Result<Query<CursorQuery>, QueryRejection>) -> ApiResult<Option<Cursor>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(query.cursor.map(Cursor))
}

/// Where a stream starts: after `Last-Event-ID` on reconnect, else `?cursor`, else the
/// oldest retained entry.
fn resume_cursor(
    headers: &HeaderMap,
    query: Result<Query<CursorQuery>, QueryRejection>,
) -> ApiResult<Cursor> {
    if let Some(value) = headers.get("last-event-id") {
        let last_seen: u64 = value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| ApiError::bad_request("Last-Event-ID must be a sequence number"))?;
        return Ok(Cursor(last_seen.saturating_add(1)));
    }
    Ok(query_cursor(query)?.unwrap_or(Cursor::START))
}

fn open_stream(
    name: &'static str,
    broadcaster: &EventBroadcaster,
    cursor: Cursor,
    state: &AppState,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if state.is_shutting_down() {
        return Err(ApiError::unavailable("Server is shutting down"));
    }

    info!(stream = name, cursor = %cursor, "Event stream opened");
    let guard = SseStreamGuard::open(name);

    let events = broadcaster
        .subscribe_from(cursor)
        .into_stream()
        .map(move |entry| {
            let _guard = &guard;
            metrics::record_sse_event(name);
            Ok(to_event(entry))
        })
        .take_until(state.shutdown_signal());

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(state.config.sse_keep_alive)))
}

fn to_event(entry: LogEntry) -> Event {
    debug!(seq = entry.seq, "Sending event");
    Event::default()
        .id(entry.seq.to_string())
        .data(entry.message.as_ref())
}
