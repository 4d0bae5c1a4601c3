use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Activity, ActivityId, Followup, FollowupId, FollowupStatus, Interaction, InteractionKind,
    Meeting, MeetingId, ParentRef,
};
use super::repository::{EngagementStore, RepositoryError};

/// Serializable copy of every record held by [`InMemoryEngagementStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    #[serde(default)]
    pub followups: Vec<Followup>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
}

impl EngagementSnapshot {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let rendered = serde_json::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot data: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
struct Tables {
    followups: BTreeMap<FollowupId, Followup>,
    activities: BTreeMap<ActivityId, Activity>,
    meetings: BTreeMap<MeetingId, Meeting>,
}

/// Process-local store implementing the engine's storage contract.
#[derive(Debug, Default)]
pub struct InMemoryEngagementStore {
    tables: Mutex<Tables>,
}

impl InMemoryEngagementStore {
    pub fn from_snapshot(snapshot: EngagementSnapshot) -> Self {
        let tables = Tables {
            followups: snapshot
                .followups
                .into_iter()
                .map(|followup| (followup.id, followup))
                .collect(),
            activities: snapshot
                .activities
                .into_iter()
                .map(|activity| (activity.id, activity))
                .collect(),
            meetings: snapshot
                .meetings
                .into_iter()
                .map(|meeting| (meeting.id, meeting))
                .collect(),
        };

        Self {
            tables: Mutex::new(tables),
        }
    }

    pub fn snapshot(&self) -> Result<EngagementSnapshot, RepositoryError> {
        let tables = self.lock()?;
        Ok(EngagementSnapshot {
            followups: tables.followups.values().cloned().collect(),
            activities: tables.activities.values().cloned().collect(),
            meetings: tables.meetings.values().cloned().collect(),
        })
    }

    pub fn insert_followup(&self, followup: Followup) -> Result<(), RepositoryError> {
        self.lock()?.followups.insert(followup.id, followup);
        Ok(())
    }

    pub fn insert_activity(&self, activity: Activity) -> Result<(), RepositoryError> {
        self.lock()?.activities.insert(activity.id, activity);
        Ok(())
    }

    pub fn insert_meeting(&self, meeting: Meeting) -> Result<(), RepositoryError> {
        self.lock()?.meetings.insert(meeting.id, meeting);
        Ok(())
    }

    /// Marks a followup archived. Returns `false` when no such followup exists.
    pub fn archive_followup(&self, id: FollowupId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;
        Ok(match tables.followups.get_mut(&id) {
            Some(followup) => {
                followup.archived = true;
                true
            }
            None => false,
        })
    }

    /// Reads a followup regardless of its archived flag.
    pub fn raw_followup(&self, id: FollowupId) -> Result<Option<Followup>, RepositoryError> {
        Ok(self.lock()?.followups.get(&id).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

fn live_for<'a, T>(rows: impl Iterator<Item = &'a T>, parent: ParentRef) -> impl Iterator<Item = &'a T>
where
    T: Interaction + 'a,
{
    rows.filter(move |row| !row.archived() && row.parent() == parent)
}

fn earliest_upcoming<'a, T>(
    rows: impl Iterator<Item = &'a T>,
    parent: ParentRef,
    after: DateTime<Utc>,
) -> Option<T>
where
    T: Interaction + Clone + 'a,
{
    live_for(rows, parent)
        .filter_map(|row| {
            row.next_action_date()
                .filter(|date| *date > after)
                .map(|date| (date, row))
        })
        .min_by_key(|(date, _)| *date)
        .map(|(_, row)| row.clone())
}

fn overdue<'a, T>(rows: impl Iterator<Item = &'a T>, parent: ParentRef, before: DateTime<Utc>) -> Vec<T>
where
    T: Interaction + Clone + 'a,
{
    live_for(rows, parent)
        .filter(|row| !row.status().is_completed())
        .filter(|row| row.effective_due_date().is_some_and(|due| due < before))
        .cloned()
        .collect()
}

fn count_created_between<'a, T>(
    rows: impl Iterator<Item = &'a T>,
    parent: ParentRef,
    created_after: DateTime<Utc>,
    created_until: DateTime<Utc>,
) -> u64
where
    T: Interaction + 'a,
{
    live_for(rows, parent)
        .filter(|row| row.created_at() > created_after && row.created_at() <= created_until)
        .count() as u64
}

#[async_trait]
impl EngagementStore for InMemoryEngagementStore {
    async fn count_created_between(
        &self,
        kind: InteractionKind,
        parent: ParentRef,
        created_after: DateTime<Utc>,
        created_until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let tables = self.lock()?;
        Ok(match kind {
            InteractionKind::Activity => count_created_between(
                tables.activities.values(),
                parent,
                created_after,
                created_until,
            ),
            InteractionKind::Meeting => count_created_between(
                tables.meetings.values(),
                parent,
                created_after,
                created_until,
            ),
        })
    }

    async fn earliest_upcoming_activity(
        &self,
        parent: ParentRef,
        after: DateTime<Utc>,
    ) -> Result<Option<Activity>, RepositoryError> {
        let tables = self.lock()?;
        Ok(earliest_upcoming(tables.activities.values(), parent, after))
    }

    async fn earliest_upcoming_meeting(
        &self,
        parent: ParentRef,
        after: DateTime<Utc>,
    ) -> Result<Option<Meeting>, RepositoryError> {
        let tables = self.lock()?;
        Ok(earliest_upcoming(tables.meetings.values(), parent, after))
    }

    async fn overdue_activities(
        &self,
        parent: ParentRef,
        before: DateTime<Utc>,
    ) -> Result<Vec<Activity>, RepositoryError> {
        let tables = self.lock()?;
        Ok(overdue(tables.activities.values(), parent, before))
    }

    async fn overdue_meetings(
        &self,
        parent: ParentRef,
        before: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, RepositoryError> {
        let tables = self.lock()?;
        Ok(overdue(tables.meetings.values(), parent, before))
    }

    async fn followup(&self, id: FollowupId) -> Result<Option<Followup>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .followups
            .get(&id)
            .filter(|followup| !followup.archived)
            .cloned())
    }

    async fn update_followup_score(
        &self,
        id: FollowupId,
        lead_score: i32,
        followup_status: FollowupStatus,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.followups.get_mut(&id) {
            Some(followup) if !followup.archived => {
                followup.lead_score = lead_score;
                followup.followup_status = followup_status;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn non_archived_followups(&self) -> Result<Vec<Followup>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .followups
            .values()
            .filter(|followup| !followup.archived)
            .cloned()
            .collect())
    }
}
