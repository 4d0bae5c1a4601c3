//! End-to-end scenarios driven through the public service facade: a snapshot-backed store,
//! interaction creation followed by the recompute hook, and the nightly batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use lead_engagement::engagement::{
    BusinessId, EngagementService, EngagementSnapshot, FixedClock, FollowupId, FollowupStatus,
    InMemoryEngagementStore, InteractionStatus, Meeting, MeetingId, NextAction, ParentRef,
    RecomputeSettings, ScoringConfig, TimeoutStore, TriggerOutcome,
};

const SNAPSHOT: &str = r#"{
    "followups": [
        { "id": 1, "priority": "HIGH", "next_action_date": "2025-08-20T09:00:00Z" },
        { "id": 2, "lead_score": 40, "followup_status": "Cold", "next_action_date": "2025-07-20T09:00:00Z" },
        { "id": 3, "archived": true, "lead_score": 110, "followup_status": "Hot" }
    ],
    "activities": [
        { "id": 1, "parent": { "kind": "followup", "id": 1 }, "created_at": "2025-07-25T09:00:00Z" },
        { "id": 2, "parent": { "kind": "followup", "id": 1 }, "created_at": "2025-07-28T09:00:00Z" },
        { "id": 3, "parent": { "kind": "followup", "id": 1 }, "created_at": "2025-07-29T09:00:00Z" },
        { "id": 4, "parent": { "kind": "followup", "id": 2 }, "created_at": "2025-06-01T09:00:00Z",
          "due_date": "2025-06-10T09:00:00Z" },
        { "id": 5, "parent": { "kind": "business", "id": 9 }, "created_at": "2025-07-01T09:00:00Z",
          "next_action_date": "2025-09-01T09:00:00Z" }
    ],
    "meetings": [
        { "id": 1, "parent": { "kind": "followup", "id": 1 }, "created_at": "2025-07-30T09:00:00Z",
          "status": "COMPLETED" },
        { "id": 2, "parent": { "kind": "business", "id": 9 }, "created_at": "2025-07-02T09:00:00Z",
          "next_action_date": "2025-08-15T09:00:00Z" }
    ]
}"#;

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

fn build() -> (
    Arc<InMemoryEngagementStore>,
    EngagementService<TimeoutStore<InMemoryEngagementStore>>,
) {
    let snapshot = EngagementSnapshot::from_json(SNAPSHOT).expect("fixture parses");
    let store = Arc::new(InMemoryEngagementStore::from_snapshot(snapshot));
    let timed = Arc::new(TimeoutStore::new(store.clone(), Duration::from_secs(1)));
    let service = EngagementService::with_settings(
        timed,
        Arc::new(FixedClock::new(reference_now())),
        ScoringConfig::default(),
        RecomputeSettings {
            trigger_timeout: Duration::from_secs(2),
            batch_concurrency: 2,
        },
    );
    (store, service)
}

#[tokio::test]
async fn meeting_creation_triggers_rescore() {
    let (store, service) = build();

    let before = service
        .compute_score(FollowupId(1))
        .await
        .expect("scores")
        .expect("followup exists");
    // three activities and one meeting in the window, plus the upcoming next action
    assert_eq!(before.score, 30 + 15 + 20);
    assert_eq!(before.status, FollowupStatus::Warm);

    for id in 10..13 {
        store
            .insert_meeting(Meeting {
                id: MeetingId(id),
                parent: ParentRef::followup(FollowupId(1)),
                status: InteractionStatus::Pending,
                created_at: reference_now(),
                due_date: None,
                summary: Some("demo".to_string()),
                next_action: None,
                next_action_date: None,
                archived: false,
            })
            .expect("meeting created");
    }

    match service.recompute(Some(FollowupId(1))).await {
        TriggerOutcome::Recomputed(score) => {
            assert_eq!(score.score, 30 + 60 + 20);
            assert_eq!(score.status, FollowupStatus::Hot);
        }
        other => panic!("expected recompute, got {other:?}"),
    }

    let stored = store
        .raw_followup(FollowupId(1))
        .expect("read")
        .expect("present");
    assert_eq!(stored.lead_score, 110);
    assert_eq!(stored.followup_status, FollowupStatus::Hot);
}

#[tokio::test]
async fn nightly_batch_rescores_live_followups_only() {
    let (store, service) = build();

    let report = service.recompute_all().await.expect("batch runs");

    let ids: Vec<FollowupId> = report.scored.iter().map(|score| score.followup_id).collect();
    assert_eq!(ids, vec![FollowupId(1), FollowupId(2)]);
    assert!(report.failures.is_empty());

    let stale = store
        .raw_followup(FollowupId(2))
        .expect("read")
        .expect("present");
    assert_eq!(stale.lead_score, -10, "overdue next action with no recent interactions");
    assert_eq!(stale.followup_status, FollowupStatus::Cold);

    let archived = store
        .raw_followup(FollowupId(3))
        .expect("read")
        .expect("present");
    assert_eq!(archived.lead_score, 110);
    assert_eq!(archived.followup_status, FollowupStatus::Hot);
}

#[tokio::test]
async fn business_actions_resolve_across_kinds() {
    let (_, service) = build();
    let business = ParentRef::business(BusinessId(9));

    match service.next_action(business).await.expect("resolves") {
        Some(NextAction::Meeting(meeting)) => assert_eq!(meeting.id, MeetingId(2)),
        other => panic!("expected meeting 2, got {other:?}"),
    }

    let overdue = service
        .overdue_actions(ParentRef::followup(FollowupId(2)))
        .await
        .expect("resolves");
    assert_eq!(overdue.overdue_activities.len(), 1);
    assert!(overdue.overdue_meetings.is_empty());

    let completed_only = service
        .overdue_actions(ParentRef::followup(FollowupId(1)))
        .await
        .expect("resolves");
    assert!(completed_only.is_empty());
}
