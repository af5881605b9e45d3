//! Server-sent progress for a full scoring pass.
//!
//! The pass runs on the blocking pool and reports batch boundaries through a
//! bounded channel; the route turns those into `progress` events and closes
//! with a single `done` event carrying the pool summary. A client that
//! disconnects early only stops the events, never the pass.

use std::convert::Infallible;

use axum::extract::Query;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::data::collection::{load_collections, DEFAULT_COLLECTIONS_PATH};
use crate::data::crew::{load_crew_catalog, DEFAULT_CREW_PATH};
use crate::data::player::{load_player_snapshot, DEFAULT_PLAYER_SNAPSHOT_PATH};
use crate::engine::{evaluate_player, score_crew_pool_with_progress};
use crate::server::api;

/// Progress events get a small buffer; the producer blocks when the consumer
/// lags instead of queueing unbounded.
const PROGRESS_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub ownership: Option<String>,
    #[serde(default)]
    pub rarity: Option<u8>,
    #[serde(default)]
    pub retrievability: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sale: Option<String>,
}

pub async fn score_stream(
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let request_id = Uuid::new_v4().to_string();
    let sale = api::flag_is_set(query.sale.as_deref());
    // Streaming has no 400 path; unparsable fields warn and fall back.
    let (filter, issues) = api::build_filter(
        query.ownership.as_deref(),
        query.rarity,
        query.retrievability.as_deref(),
        query.search.as_deref(),
    );
    for issue in &issues {
        eprintln!(
            "score stream: ignoring {}: {}",
            issue.field,
            issue.messages.join(", ")
        );
    }

    let (tx, rx) = tokio::sync::mpsc::channel::<Event>(PROGRESS_CHANNEL_CAPACITY);
    tokio::task::spawn_blocking(move || {
        let definitions = load_collections(DEFAULT_COLLECTIONS_PATH).unwrap_or_default();
        let catalog = load_crew_catalog(DEFAULT_CREW_PATH).unwrap_or_default();
        let player = load_player_snapshot(DEFAULT_PLAYER_SNAPSHOT_PATH);
        let mut view = evaluate_player(&definitions, &catalog, &player);

        let summary = score_crew_pool_with_progress(
            &mut view.crew,
            &view.collections,
            &filter,
            sale,
            |done, total| {
                let data = serde_json::json!({ "done": done, "total": total });
                let _ = tx.blocking_send(Event::default().event("progress").data(data.to_string()));
            },
        );

        let data = serde_json::json!({ "request_id": request_id, "summary": summary });
        let _ = tx.blocking_send(Event::default().event("done").data(data.to_string()));
    });

    Sse::new(ReceiverStream::new(rx).map(Ok)).keep_alive(KeepAlive::default())
}
