//! Server-Sent Events stream of public feed changes.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use futures::stream;
use tokio::sync::mpsc;

use quill_core::PostListing;
use quill_core::domain::PostChange;
use quill_core::ports::SubscriptionId;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Changes buffered per client. Overflow is dropped; clients refetch anyway.
const CLIENT_BUFFER: usize = 64;

/// Unsubscribes when the client goes away and the stream is dropped.
struct SubscriptionGuard {
    listing: Arc<PostListing>,
    id: SubscriptionId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let listing = self.listing.clone();
        let id = self.id;
        actix_web::rt::spawn(async move {
            if let Err(e) = listing.unsubscribe(id).await {
                tracing::warn!("Failed to drop change subscription: {}", e);
            }
        });
    }
}

fn sse_frame(change: &PostChange) -> Option<web::Bytes> {
    let data = serde_json::to_string(change).ok()?;
    let event = serde_json::to_value(change.kind).ok()?;
    let event = event.as_str()?;
    Some(web::Bytes::from(format!("event: {event}\ndata: {data}\n\n")))
}

/// GET /api/posts/events
///
/// Emits one event per change that may alter the public feed. Clients are
/// expected to refetch the feed rather than trust the payload.
pub async fn post_events(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let (tx, rx) = mpsc::channel::<PostChange>(CLIENT_BUFFER);

    let id = state
        .listing
        .subscribe(Box::new(move |change| {
            let tx = tx.clone();
            Box::pin(async move {
                // Closed: the client left and its guard unsubscribes.
                if let Err(mpsc::error::TrySendError::Full(change)) = tx.try_send(change) {
                    tracing::debug!(
                        post_id = %change.post_id,
                        "Slow change stream, dropping event"
                    );
                }
            })
        }))
        .await?;

    let guard = SubscriptionGuard {
        listing: state.listing.clone(),
        id,
    };
    tracing::debug!(subscription = %id.0, "Change stream opened");

    let body = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        loop {
            let change = rx.recv().await?;
            if !change.affects_public_feed() {
                continue;
            }
            if let Some(frame) = sse_frame(&change) {
                return Some((Ok::<_, actix_web::Error>(frame), (rx, guard)));
            }
        }
    });

    Ok(HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(body))
}
