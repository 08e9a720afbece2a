//! Server-Sent Events stream for tracker change notifications
//!
//! Every subscriber receives a full-state snapshot on connect, then
//! incremental events in commit order. There is no replay: a reconnecting
//! client's snapshot is its gap recovery.

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

use tlft_common::events::TrackerEvent;

use crate::db::trackers;
use crate::AppState;

/// GET /api/events - SSE event stream
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to tracker events");

    // Subscribe before the snapshot is read so no committed mutation falls
    // between snapshot and stream
    let mut rx = state.bus.subscribe();

    let stream = async_stream::stream! {
        // Full-state snapshot on connect
        let snapshot = match trackers::list_all(&state.db).await {
            Ok(trackers) => TrackerEvent::InitialState {
                trackers,
                timestamp: chrono::Utc::now(),
            },
            Err(e) => {
                warn!("SSE: Failed to build initial snapshot: {e}");
                TrackerEvent::InitialState {
                    trackers: Vec::new(),
                    timestamp: chrono::Utc::now(),
                }
            }
        };
        if let Ok(json) = serde_json::to_string(&snapshot) {
            yield Ok(Event::default().event(snapshot.event_type()).data(json));
        }

        loop {
            tokio::select! {
                // Heartbeat every 15 seconds
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                // Broadcast events
                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            let event_type = event.event_type();
                            match serde_json::to_string(&event) {
                                Ok(event_json) => {
                                    debug!("SSE: Broadcasting event: {}", event_type);
                                    yield Ok(Event::default()
                                        .event(event_type)
                                        .data(event_json));
                                }
                                Err(e) => {
                                    warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                                }
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                            // Dropped events cannot be replayed; the client
                            // should reconnect for a fresh snapshot
                            warn!("SSE: Subscriber lagged, {missed} events dropped");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            info!("SSE: Event bus closed, ending stream");
                            break;
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
