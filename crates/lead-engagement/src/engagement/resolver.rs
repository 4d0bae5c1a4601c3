use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Activity, Interaction, InteractionKind, Meeting, ParentRef};
use super::repository::{EngagementStore, RepositoryError};

/// Nearest scheduled interaction for a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextAction {
    Activity(Activity),
    Meeting(Meeting),
}

impl NextAction {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::Activity(_) => InteractionKind::Activity,
            Self::Meeting(_) => InteractionKind::Meeting,
        }
    }

    pub fn next_action_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Activity(activity) => activity.next_action_date,
            Self::Meeting(meeting) => meeting.next_action_date,
        }
    }
}

/// Past-due interactions for a parent, kept split by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverdueActions {
    pub overdue_activities: Vec<Activity>,
    pub overdue_meetings: Vec<Meeting>,
}

impl OverdueActions {
    pub fn is_empty(&self) -> bool {
        self.overdue_activities.is_empty() && self.overdue_meetings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overdue_activities.len() + self.overdue_meetings.len()
    }
}

/// Resolves next and overdue actions for either parent kind.
pub struct ActionResolver<S: ?Sized> {
    store: Arc<S>,
}

impl<S> ActionResolver<S>
where
    S: EngagementStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns `None` when neither kind has an upcoming, non-archived record.
    pub async fn next_action(
        &self,
        parent: ParentRef,
        now: DateTime<Utc>,
    ) -> Result<Option<NextAction>, RepositoryError> {
        let (activity, meeting) = tokio::try_join!(
            self.store.earliest_upcoming_activity(parent, now),
            self.store.earliest_upcoming_meeting(parent, now),
        )?;

        let next = pick_earliest(activity, meeting);
        debug!(%parent, kind = ?next.as_ref().map(NextAction::kind), "next action resolved");
        Ok(next)
    }

    pub async fn overdue_actions(
        &self,
        parent: ParentRef,
        now: DateTime<Utc>,
    ) -> Result<OverdueActions, RepositoryError> {
        let (mut overdue_activities, mut overdue_meetings) = tokio::try_join!(
            self.store.overdue_activities(parent, now),
            self.store.overdue_meetings(parent, now),
        )?;

        overdue_activities.sort_by_key(|activity| (activity.effective_due_date(), activity.id));
        overdue_meetings.sort_by_key(|meeting| (meeting.effective_due_date(), meeting.id));

        Ok(OverdueActions {
            overdue_activities,
            overdue_meetings,
        })
    }
}

/// Earlier `next_action_date` wins; an activity wins a tie.
pub(crate) fn pick_earliest(
    activity: Option<Activity>,
    meeting: Option<Meeting>,
) -> Option<NextAction> {
    match (activity, meeting) {
        (Some(activity), Some(meeting)) => {
            let meeting_first = match (activity.next_action_date, meeting.next_action_date) {
                (Some(activity_date), Some(meeting_date)) => meeting_date < activity_date,
                (None, Some(_)) => true,
                _ => false,
            };
            if meeting_first {
                Some(NextAction::Meeting(meeting))
            } else {
                Some(NextAction::Activity(activity))
            }
        }
        (Some(activity), None) => Some(NextAction::Activity(activity)),
        (None, Some(meeting)) => Some(NextAction::Meeting(meeting)),
        (None, None) => None,
    }
}
