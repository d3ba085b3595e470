//! Server-Sent Events rendering of a drafting run.
//!
//! Every [`DraftEvent`] becomes one SSE event whose name is the event type
//! and whose data is the event as JSON. The stream ends after the terminal
//! event because the manager drops its sender.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use tokio::sync::mpsc;

use crate::application::DraftEvent;

/// Interval between keep-alive comments on an idle stream.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Wraps a drafting run's receiver into an SSE response.
///
/// Dropping the response body drops the receiver, which the manager treats
/// as a cancellation.
pub fn draft_event_response(
    receiver: mpsc::Receiver<DraftEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = stream::unfold(receiver, |mut receiver| async move {
        let event = receiver.recv().await?;
        Some((Ok(to_sse_event(&event)), receiver))
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

/// Renders one drafting event.
pub fn to_sse_event(event: &DraftEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(data) => Event::default().event(event.name()).data(data),
        Err(e) => {
            tracing::error!(error = %e, event = event.name(), "failed to serialize draft event");
            Event::default()
                .event("error")
                .data(r#"{"type":"error","message":"serialization failed"}"#)
        }
    }
}
