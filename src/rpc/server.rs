use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use super::{
    LOCAL_AGGREGATES_PATH, LOCAL_AGGREGATE_BY_ID_PATH, LOCAL_COMMAND_RESPONSES_PATH,
    LOCAL_STATS_PATH,
};
use crate::domain::Aggregate;
use crate::store::LocalReads;

type Reads<A> = Arc<dyn LocalReads<A>>;

/// Peer endpoint routes over this node's views.
pub fn router<A: Aggregate>(reads: Reads<A>) -> Router {
    Router::new()
        .route(LOCAL_AGGREGATES_PATH, get(list_aggregates::<A>))
        .route(LOCAL_STATS_PATH, get(state_counts::<A>))
        .route(
            &format!("{LOCAL_AGGREGATE_BY_ID_PATH}/:id"),
            get(get_aggregate::<A>),
        )
        .route(
            &format!("{LOCAL_COMMAND_RESPONSES_PATH}/:command_id"),
            get(get_command_response::<A>),
        )
        .with_state(reads)
}

async fn list_aggregates<A: Aggregate>(State(reads): State<Reads<A>>) -> Json<Vec<A>> {
    Json(reads.find_all_local().await)
}

async fn state_counts<A: Aggregate>(
    State(reads): State<Reads<A>>,
) -> Json<BTreeMap<String, u64>> {
    Json(reads.state_counts_local().await)
}

async fn get_aggregate<A: Aggregate>(
    State(reads): State<Reads<A>>,
    Path(id): Path<String>,
) -> Response {
    match reads.find_by_id_local(&id).await {
        Some(aggregate) => Json(aggregate).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_command_response<A: Aggregate>(
    State(reads): State<Reads<A>>,
    Path(command_id): Path<String>,
) -> Response {
    match reads.command_response_local(&command_id).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
