use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::engagement::domain::{
    BusinessId, FollowupId, FollowupStatus, InteractionKind, InteractionStatus, ParentRef,
};
use crate::engagement::memory::{EngagementSnapshot, InMemoryEngagementStore};
use crate::engagement::repository::{EngagementStore, RepositoryError, TimeoutStore};

#[tokio::test]
async fn counts_exclude_archived_old_and_foreign_rows() {
    let parent = ParentRef::followup(FollowupId(1));
    let mut archived = activity(3, parent, days_ago(2));
    archived.archived = true;

    let store = seeded_store(
        vec![followup(1)],
        vec![
            activity(1, parent, days_ago(1)),
            activity(2, parent, days_ago(29)),
            archived,
            activity(4, parent, days_ago(30)),
            activity(5, parent, days_ago(45)),
            activity(6, ParentRef::followup(FollowupId(2)), days_ago(1)),
            activity(7, ParentRef::business(BusinessId(1)), days_ago(1)),
        ],
        vec![meeting(1, parent, days_ago(3))],
    );

    let activities = store
        .count_created_between(InteractionKind::Activity, parent, days_ago(30), now())
        .await
        .expect("count activities");
    let meetings = store
        .count_created_between(InteractionKind::Meeting, parent, days_ago(30), now())
        .await
        .expect("count meetings");

    assert_eq!(activities, 2, "window start is exclusive and archived rows are ignored");
    assert_eq!(meetings, 1);
}

#[tokio::test]
async fn counts_exclude_rows_created_after_the_reference_instant() {
    let parent = ParentRef::followup(FollowupId(1));
    let store = seeded_store(
        vec![followup(1)],
        vec![
            activity(1, parent, now()),
            activity(2, parent, days_ahead(5)),
        ],
        vec![meeting(1, parent, days_ahead(1))],
    );

    let activities = store
        .count_created_between(InteractionKind::Activity, parent, days_ago(30), now())
        .await
        .expect("count activities");
    let meetings = store
        .count_created_between(InteractionKind::Meeting, parent, days_ago(30), now())
        .await
        .expect("count meetings");

    assert_eq!(activities, 1, "a row created exactly at the reference instant counts");
    assert_eq!(meetings, 0);
}

#[tokio::test]
async fn archived_followups_are_invisible_and_cannot_be_updated() {
    let mut hidden = followup(2);
    hidden.archived = true;
    hidden.lead_score = 75;
    hidden.followup_status = FollowupStatus::Warm;
    let store = seeded_store(vec![followup(1), hidden], Vec::new(), Vec::new());

    assert!(store.followup(FollowupId(2)).await.expect("read").is_none());
    let listed = store.non_archived_followups().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, FollowupId(1));

    assert_eq!(
        store
            .update_followup_score(FollowupId(2), 0, FollowupStatus::Cold)
            .await,
        Err(RepositoryError::NotFound)
    );
    let raw = store
        .raw_followup(FollowupId(2))
        .expect("raw read")
        .expect("archived record retained");
    assert_eq!(raw.lead_score, 75, "archiving keeps the last computed score");
}

#[tokio::test]
async fn overdue_queries_use_next_action_then_due_date() {
    let parent = ParentRef::business(BusinessId(4));

    let mut rescheduled = activity(1, parent, days_ago(10));
    rescheduled.due_date = Some(days_ago(5));
    rescheduled.next_action_date = Some(days_ahead(2));

    let mut lapsed = activity(2, parent, days_ago(10));
    lapsed.due_date = Some(days_ago(5));

    let mut completed = activity(3, parent, days_ago(10));
    completed.next_action_date = Some(days_ago(1));
    completed.status = InteractionStatus::Completed;

    let undated = activity(4, parent, days_ago(10));

    let store = seeded_store(
        Vec::new(),
        vec![rescheduled, lapsed, completed, undated],
        Vec::new(),
    );
    let overdue = store
        .overdue_activities(parent, now())
        .await
        .expect("overdue activities");

    let ids: Vec<i64> = overdue.iter().map(|activity| activity.id.0).collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn snapshot_round_trips_through_json() {
    let parent = ParentRef::followup(FollowupId(1));
    let store = seeded_store(
        vec![followup(1)],
        vec![activity(1, parent, days_ago(1))],
        vec![scheduled_meeting(1, parent, days_ahead(2))],
    );

    let snapshot = store.snapshot().expect("snapshot");
    let rendered = serde_json::to_string(&snapshot).expect("serialize snapshot");
    let reloaded = EngagementSnapshot::from_json(&rendered).expect("parse snapshot");
    assert_eq!(reloaded, snapshot);

    let restored = InMemoryEngagementStore::from_snapshot(reloaded);
    assert!(restored
        .earliest_upcoming_meeting(parent, now())
        .await
        .expect("query")
        .is_some());
}

#[test]
fn snapshot_accepts_sparse_legacy_records() {
    let raw = r#"{
        "followups": [{ "id": 7, "next_action_date": "2025-08-10T09:00:00Z" }],
        "activities": [{
            "id": 1,
            "parent": { "kind": "followup", "id": 7 },
            "status": "IN_PROGRESS",
            "created_at": "2025-07-30T09:00:00Z",
            "end_date": "2025-07-31T09:00:00Z"
        }]
    }"#;

    let snapshot = EngagementSnapshot::from_json(raw).expect("parse");
    assert_eq!(snapshot.followups[0].followup_status, FollowupStatus::Cold);
    assert_eq!(snapshot.followups[0].lead_score, 0);
    assert_eq!(snapshot.activities[0].status, InteractionStatus::InProgress);
    assert_eq!(snapshot.activities[0].due_date, Some(on(2025, 7, 31)));
    assert!(snapshot.meetings.is_empty());
}

#[tokio::test]
async fn timeout_store_reports_slow_calls() {
    let scripted = ScriptedStore {
        followup_delay: Some(Duration::from_millis(200)),
        ..ScriptedStore::wrapping(InMemoryEngagementStore::default())
    };
    let store = TimeoutStore::new(Arc::new(scripted), Duration::from_millis(20));

    match store.followup(FollowupId(1)).await {
        Err(RepositoryError::Timeout { operation, after }) => {
            assert_eq!(operation, "followup");
            assert_eq!(after, Duration::from_millis(20));
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    assert!(store.non_archived_followups().await.expect("fast call").is_empty());
}
