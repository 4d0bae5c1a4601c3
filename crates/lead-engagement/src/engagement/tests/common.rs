use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::engagement::clock::FixedClock;
use crate::engagement::domain::{
    Activity, ActivityId, Followup, FollowupId, FollowupStatus, InteractionKind,
    InteractionStatus, Meeting, MeetingId, ParentRef,
};
use crate::engagement::memory::InMemoryEngagementStore;
use crate::engagement::recompute::RecomputeSettings;
use crate::engagement::repository::{EngagementStore, RepositoryError};
use crate::engagement::scoring::ScoringConfig;
use crate::engagement::service::EngagementService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0)
        .single()
        .expect("valid reference instant")
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - chrono::Duration::days(days)
}

pub(super) fn days_ahead(days: i64) -> DateTime<Utc> {
    now() + chrono::Duration::days(days)
}

pub(super) fn on(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .expect("valid date")
}

pub(super) fn followup(id: i64) -> Followup {
    Followup::new(FollowupId(id))
}

pub(super) fn activity(id: i64, parent: ParentRef, created_at: DateTime<Utc>) -> Activity {
    Activity {
        id: ActivityId(id),
        parent,
        status: InteractionStatus::Pending,
        created_at,
        due_date: None,
        action_detail: Some(format!("call #{id}")),
        next_action: None,
        next_action_date: None,
        archived: false,
    }
}

pub(super) fn meeting(id: i64, parent: ParentRef, created_at: DateTime<Utc>) -> Meeting {
    Meeting {
        id: MeetingId(id),
        parent,
        status: InteractionStatus::Pending,
        created_at,
        due_date: None,
        summary: Some(format!("meeting #{id}")),
        next_action: None,
        next_action_date: None,
        archived: false,
    }
}

pub(super) fn scheduled_activity(id: i64, parent: ParentRef, at: DateTime<Utc>) -> Activity {
    Activity {
        next_action_date: Some(at),
        ..activity(id, parent, days_ago(1))
    }
}

pub(super) fn scheduled_meeting(id: i64, parent: ParentRef, at: DateTime<Utc>) -> Meeting {
    Meeting {
        next_action_date: Some(at),
        ..meeting(id, parent, days_ago(1))
    }
}

pub(super) fn seeded_store(
    followups: Vec<Followup>,
    activities: Vec<Activity>,
    meetings: Vec<Meeting>,
) -> Arc<InMemoryEngagementStore> {
    let store = InMemoryEngagementStore::default();
    for record in followups {
        store.insert_followup(record).expect("insert followup");
    }
    for record in activities {
        store.insert_activity(record).expect("insert activity");
    }
    for record in meetings {
        store.insert_meeting(record).expect("insert meeting");
    }
    Arc::new(store)
}

pub(super) fn service_for<S>(store: Arc<S>) -> EngagementService<S>
where
    S: EngagementStore + 'static,
{
    EngagementService::with_settings(
        store,
        Arc::new(FixedClock::new(now())),
        ScoringConfig::default(),
        RecomputeSettings {
            trigger_timeout: Duration::from_millis(100),
            batch_concurrency: 4,
        },
    )
}

/// In-memory store with knobs for simulating failures, latency and concurrent archiving.
#[derive(Default)]
pub(super) struct ScriptedStore {
    pub(super) inner: InMemoryEngagementStore,
    pub(super) unavailable: bool,
    pub(super) failing_updates: Vec<FollowupId>,
    pub(super) archive_after_listing: Option<FollowupId>,
    pub(super) archive_after_read: Option<FollowupId>,
    pub(super) followup_delay: Option<Duration>,
    pub(super) listed: AtomicBool,
}

impl ScriptedStore {
    pub(super) fn wrapping(inner: InMemoryEngagementStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            Err(RepositoryError::Unavailable("database offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EngagementStore for ScriptedStore {
    async fn count_created_between(
        &self,
        kind: InteractionKind,
        parent: ParentRef,
        created_after: DateTime<Utc>,
        created_until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        self.check()?;
        self.inner
            .count_created_between(kind, parent, created_after, created_until)
            .await
    }

    async fn earliest_upcoming_activity(
        &self,
        parent: ParentRef,
        after: DateTime<Utc>,
    ) -> Result<Option<Activity>, RepositoryError> {
        self.check()?;
        self.inner.earliest_upcoming_activity(parent, after).await
    }

    async fn earliest_upcoming_meeting(
        &self,
        parent: ParentRef,
        after: DateTime<Utc>,
    ) -> Result<Option<Meeting>, RepositoryError> {
        self.check()?;
        self.inner.earliest_upcoming_meeting(parent, after).await
    }

    async fn overdue_activities(
        &self,
        parent: ParentRef,
        before: DateTime<Utc>,
    ) -> Result<Vec<Activity>, RepositoryError> {
        self.check()?;
        self.inner.overdue_activities(parent, before).await
    }

    async fn overdue_meetings(
        &self,
        parent: ParentRef,
        before: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, RepositoryError> {
        self.check()?;
        self.inner.overdue_meetings(parent, before).await
    }

    async fn followup(&self, id: FollowupId) -> Result<Option<Followup>, RepositoryError> {
        self.check()?;
        if let Some(delay) = self.followup_delay {
            tokio::time::sleep(delay).await;
        }
        let found = self.inner.followup(id).await?;
        if self.archive_after_read == Some(id) {
            self.inner.archive_followup(id)?;
        }
        Ok(found)
    }

    async fn update_followup_score(
        &self,
        id: FollowupId,
        lead_score: i32,
        followup_status: FollowupStatus,
    ) -> Result<(), RepositoryError> {
        self.check()?;
        if self.failing_updates.contains(&id) {
            return Err(RepositoryError::Unavailable(format!(
                "write rejected for followup {id}"
            )));
        }
        self.inner
            .update_followup_score(id, lead_score, followup_status)
            .await
    }

    async fn non_archived_followups(&self) -> Result<Vec<Followup>, RepositoryError> {
        self.check()?;
        let listed = self.inner.non_archived_followups().await?;
        if let Some(id) = self.archive_after_listing {
            self.inner.archive_followup(id)?;
        }
        self.listed.store(true, Ordering::SeqCst);
        Ok(listed)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
