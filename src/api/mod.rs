//! Client-facing HTTP API.
//!
//! - `GET /aggregates`, `GET /aggregates/stats`, `GET /aggregates/:id`:
//!   routed reads, retried with backoff on transient failures
//! - `POST /commands`: validate, submit, and wait for the outcome

mod errmsg;


use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use backon::Retryable;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::correlation::CommandGateway;
use crate::domain::{Aggregate, CommandRequest};
use crate::error::{FleetError, Result};
use crate::router::QueryRouter;
use crate::utils::retry::RetryPolicy;

/// Shared state of the API handlers.
pub struct ApiState<A> {
    pub router: QueryRouter<A>,
    pub gateway: Arc<CommandGateway>,
    /// Command response polling.
    pub polling: RetryPolicy,
    /// Retries of transient read failures.
    pub query_retry: RetryPolicy,
}

type AppState<A> = Arc<ApiState<A>>;

pub fn router<A: Aggregate>(state: AppState<A>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/aggregates", get(list_aggregates::<A>))
        .route("/aggregates/stats", get(aggregate_stats::<A>))
        .route("/aggregates/:id", get(get_aggregate::<A>))
        .route("/commands", post(submit_command::<A>))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_aggregates<A: Aggregate>(State(state): State<AppState<A>>) -> Result<Json<Vec<A>>> {
    let router = &state.router;
    with_retry(&state.query_retry, || router.find_all())
        .await
        .map(Json)
}

async fn aggregate_stats<A: Aggregate>(
    State(state): State<AppState<A>>,
) -> Result<Json<BTreeMap<String, u64>>> {
    let router = &state.router;
    with_retry(&state.query_retry, || router.aggregate_stats())
        .await
        .map(Json)
}

async fn get_aggregate<A: Aggregate>(
    State(state): State<AppState<A>>,
    Path(id): Path<String>,
) -> Result<Json<A>> {
    let router = &state.router;
    let id = id.as_str();
    with_retry(&state.query_retry, || router.find_by_id(id))
        .await
        .map(Json)
}

async fn submit_command<A: Aggregate>(
    State(state): State<AppState<A>>,
    Json(request): Json<CommandRequest>,
) -> Result<Response> {
    request.validate()?;
    if request.domain() != A::DOMAIN {
        return Err(FleetError::InvalidRequest(format!(
            "{} commands are not served here",
            request.domain()
        )));
    }

    let is_create = request.is_create();
    let command = request.into_command(Uuid::new_v4().to_string());
    let response = state.gateway.execute(command, &state.polling).await?;

    if !response.is_succeeded() {
        let reason = response.reason().unwrap_or_default().to_string();
        debug!(command_id = %response.command_id(), reason = %reason, "Command rejected");
        return Ok((StatusCode::BAD_REQUEST, reason).into_response());
    }
    if !is_create {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let resource_id = response.resource_id().unwrap_or_default();
    let router = &state.router;
    let aggregate = with_retry(&state.query_retry, || router.find_by_id(resource_id)).await?;
    Ok((StatusCode::CREATED, Json(aggregate)).into_response())
}

/// Run `op`, retrying transient failures per `policy`.
async fn with_retry<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    op.retry(policy.backoff())
        .when(FleetError::is_retryable)
        .notify(|e: &FleetError, delay: Duration| {
            warn!(error = %e, delay = ?delay, "Read failed, retrying");
        })
        .await
}

impl IntoResponse for FleetError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            FleetError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            FleetError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            FleetError::ResponseTimeout { .. } => {
                warn!(error = %self, "Command response timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    errmsg::RESPONSE_TIMEOUT.to_string(),
                )
            }
            FleetError::Unavailable(detail) => {
                warn!(detail = %detail, "Request failed: peer unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    errmsg::SERVICE_UNAVAILABLE.to_string(),
                )
            }
            _ => {
                error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    errmsg::INTERNAL_ERROR.to_string(),
                )
            }
        };
        (status, message).into_response()
    }
}
