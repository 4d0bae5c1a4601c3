use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{BusinessId, FollowupId, ParentRef};
use super::repository::EngagementStore;
use super::service::{EngagementError, EngagementService};

/// Router builder exposing the scoring trigger and action-resolution endpoints.
pub fn engagement_router<S>(service: Arc<EngagementService<S>>) -> Router
where
    S: EngagementStore + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/followups/score", post(recompute_all_handler::<S>))
        .route(
            "/api/v1/followups/:followup_id/score",
            post(score_handler::<S>),
        )
        .route(
            "/api/v1/followups/:followup_id/next-action",
            get(followup_next_action_handler::<S>),
        )
        .route(
            "/api/v1/followups/:followup_id/overdue-actions",
            get(followup_overdue_actions_handler::<S>),
        )
        .route(
            "/api/v1/businesses/:business_id/next-action",
            get(business_next_action_handler::<S>),
        )
        .route(
            "/api/v1/businesses/:business_id/overdue-actions",
            get(business_overdue_actions_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(followup_id): Path<i64>,
) -> Response
where
    S: EngagementStore + ?Sized + 'static,
{
    match service.compute_score(FollowupId(followup_id)).await {
        Ok(Some(score)) => (StatusCode::OK, axum::Json(score)).into_response(),
        Ok(None) => {
            let payload = json!({
                "followup_id": followup_id,
                "error": "followup not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => persistence_failure(err),
    }
}

pub(crate) async fn recompute_all_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
) -> Response
where
    S: EngagementStore + ?Sized + 'static,
{
    match service.recompute_all().await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => persistence_failure(err),
    }
}

async fn followup_next_action_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(followup_id): Path<i64>,
) -> Response
where
    S: EngagementStore + ?Sized + 'static,
{
    next_action_response(&service, ParentRef::followup(FollowupId(followup_id))).await
}

async fn followup_overdue_actions_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(followup_id): Path<i64>,
) -> Response
where
    S: EngagementStore + ?Sized + 'static,
{
    overdue_actions_response(&service, ParentRef::followup(FollowupId(followup_id))).await
}

async fn business_next_action_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(business_id): Path<i64>,
) -> Response
where
    S: EngagementStore + ?Sized + 'static,
{
    next_action_response(&service, ParentRef::business(BusinessId(business_id))).await
}

async fn business_overdue_actions_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(business_id): Path<i64>,
) -> Response
where
    S: EngagementStore + ?Sized + 'static,
{
    overdue_actions_response(&service, ParentRef::business(BusinessId(business_id))).await
}

pub(crate) async fn next_action_response<S>(
    service: &EngagementService<S>,
    parent: ParentRef,
) -> Response
where
    S: EngagementStore + ?Sized + 'static,
{
    match service.next_action(parent).await {
        Ok(Some(action)) => (StatusCode::OK, axum::Json(action)).into_response(),
        Ok(None) => {
            let payload = json!({ "message": "No upcoming actions" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => persistence_failure(err),
    }
}

pub(crate) async fn overdue_actions_response<S>(
    service: &EngagementService<S>,
    parent: ParentRef,
) -> Response
where
    S: EngagementStore + ?Sized + 'static,
{
    match service.overdue_actions(parent).await {
        Ok(overdue) => (StatusCode::OK, axum::Json(overdue)).into_response(),
        Err(err) => persistence_failure(err),
    }
}

fn persistence_failure(err: EngagementError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
