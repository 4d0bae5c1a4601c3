use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{
    Activity, Followup, FollowupId, FollowupStatus, InteractionKind, Meeting, ParentRef,
};

/// Storage contract consumed by the engine.
///
/// Every method applies the soft-delete predicate itself: archived followups, activities
/// and meetings are never returned, counted, or updated.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Interactions of `kind` owned by `parent` with
    /// `created_after < created_at <= created_until`.
    async fn count_created_between(
        &self,
        kind: InteractionKind,
        parent: ParentRef,
        created_after: DateTime<Utc>,
        created_until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Activity with the earliest `next_action_date` strictly after `after`.
    async fn earliest_upcoming_activity(
        &self,
        parent: ParentRef,
        after: DateTime<Utc>,
    ) -> Result<Option<Activity>, RepositoryError>;

    /// Meeting with the earliest `next_action_date` strictly after `after`.
    async fn earliest_upcoming_meeting(
        &self,
        parent: ParentRef,
        after: DateTime<Utc>,
    ) -> Result<Option<Meeting>, RepositoryError>;

    /// Non-completed activities whose effective due date is strictly before `before`.
    async fn overdue_activities(
        &self,
        parent: ParentRef,
        before: DateTime<Utc>,
    ) -> Result<Vec<Activity>, RepositoryError>;

    /// Non-completed meetings whose effective due date is strictly before `before`.
    async fn overdue_meetings(
        &self,
        parent: ParentRef,
        before: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, RepositoryError>;

    async fn followup(&self, id: FollowupId) -> Result<Option<Followup>, RepositoryError>;

    /// Writes the engine-owned score fields. Returns `RepositoryError::NotFound` when the
    /// followup no longer exists or has been archived.
    async fn update_followup_score(
        &self,
        id: FollowupId,
        lead_score: i32,
        followup_status: FollowupStatus,
    ) -> Result<(), RepositoryError>;

    async fn non_archived_followups(&self) -> Result<Vec<Followup>, RepositoryError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Decorator bounding every call of the wrapped store with the same deadline.
pub struct TimeoutStore<S: ?Sized> {
    inner: Arc<S>,
    limit: Duration,
}

impl<S: ?Sized> TimeoutStore<S> {
    pub fn new(inner: Arc<S>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>> + Send,
    {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout {
                operation,
                after: self.limit,
            }),
        }
    }
}

#[async_trait]
impl<S> EngagementStore for TimeoutStore<S>
where
    S: EngagementStore + ?Sized,
{
    async fn count_created_between(
        &self,
        kind: InteractionKind,
        parent: ParentRef,
        created_after: DateTime<Utc>,
        created_until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        self.bounded(
            "count_created_between",
            self.inner
                .count_created_between(kind, parent, created_after, created_until),
        )
        .await
    }

    async fn earliest_upcoming_activity(
        &self,
        parent: ParentRef,
        after: DateTime<Utc>,
    ) -> Result<Option<Activity>, RepositoryError> {
        self.bounded(
            "earliest_upcoming_activity",
            self.inner.earliest_upcoming_activity(parent, after),
        )
        .await
    }

    async fn earliest_upcoming_meeting(
        &self,
        parent: ParentRef,
        after: DateTime<Utc>,
    ) -> Result<Option<Meeting>, RepositoryError> {
        self.bounded(
            "earliest_upcoming_meeting",
            self.inner.earliest_upcoming_meeting(parent, after),
        )
        .await
    }

    async fn overdue_activities(
        &self,
        parent: ParentRef,
        before: DateTime<Utc>,
    ) -> Result<Vec<Activity>, RepositoryError> {
        self.bounded(
            "overdue_activities",
            self.inner.overdue_activities(parent, before),
        )
        .await
    }

    async fn overdue_meetings(
        &self,
        parent: ParentRef,
        before: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, RepositoryError> {
        self.bounded("overdue_meetings", self.inner.overdue_meetings(parent, before))
            .await
    }

    async fn followup(&self, id: FollowupId) -> Result<Option<Followup>, RepositoryError> {
        self.bounded("followup", self.inner.followup(id)).await
    }

    async fn update_followup_score(
        &self,
        id: FollowupId,
        lead_score: i32,
        followup_status: FollowupStatus,
    ) -> Result<(), RepositoryError> {
        self.bounded(
            "update_followup_score",
            self.inner
                .update_followup_score(id, lead_score, followup_status),
        )
        .await
    }

    async fn non_archived_followups(&self) -> Result<Vec<Followup>, RepositoryError> {
        self.bounded("non_archived_followups", self.inner.non_archived_followups())
            .await
    }
}
