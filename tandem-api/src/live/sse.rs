//! Server-Sent Events rendering of a match subscription.
//!
//! Frames:
//!   event: insert | update    id: <message id>    data: LiveEvent JSON
//!   event: resync             data: {"skipped": n}
//!
//! `resync` means the subscriber fell behind the channel buffer and should
//! refetch the history; the stream keeps going afterwards.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use super::feed::{LiveEvent, Subscription};

#[derive(Debug, Clone, PartialEq)]
pub enum LiveFrame {
    Event(LiveEvent),
    Resync { skipped: u64 },
}

impl LiveFrame {
    fn into_sse(self) -> Option<SseEvent> {
        match self {
            LiveFrame::Event(event) => {
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("SSE: failed to serialize live event: {e}");
                        return None;
                    }
                };
                Some(
                    SseEvent::default()
                        .event(event.kind.as_str())
                        .id(event.message.id.to_string())
                        .data(json),
                )
            }
            LiveFrame::Resync { skipped } => Some(
                SseEvent::default()
                    .event("resync")
                    .data(format!("{{\"skipped\":{skipped}}}")),
            ),
        }
    }
}

/// Turns a subscription into frames until the channel closes.
pub fn frames(mut subscription: Subscription) -> impl Stream<Item = LiveFrame> {
    async_stream::stream! {
        loop {
            match subscription.recv().await {
                Ok(event) => yield LiveFrame::Event(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "live subscriber lagged");
                    yield LiveFrame::Resync { skipped };
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// SSE response for one match; heartbeats every 15 seconds keep proxies from
/// closing an idle connection.
pub fn live_stream(
    match_id: Uuid,
    subscription: Subscription,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    info!(match_id = %match_id, "live subscriber connected");

    let stream = frames(subscription).filter_map(|frame| async move { frame.into_sse().map(Ok) });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
