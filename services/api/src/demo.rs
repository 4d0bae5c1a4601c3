use crate::commands::{render_batch, render_next_action, render_overdue, render_score};
use crate::infra::EngineHandle;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use lead_engagement::config::EngineConfig;
use lead_engagement::engagement::{
    Activity, ActivityId, BusinessId, EngagementSnapshot, Followup, FollowupId, FollowupStatus,
    InteractionStatus, Meeting, MeetingId, ParentRef, Priority, TriggerOutcome,
};
use lead_engagement::error::AppError;
use std::path::PathBuf;

const ACTIVE_FOLLOWUP: FollowupId = FollowupId(101);
const STALLED_FOLLOWUP: FollowupId = FollowupId(102);
const ARCHIVED_FOLLOWUP: FollowupId = FollowupId(103);
const DEMO_BUSINESS: BusinessId = BusinessId(501);

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluate as of this RFC 3339 instant (defaults to now).
    #[arg(long, value_parser = crate::infra::parse_datetime)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Write the demo records, including recomputed scores, to this JSON file.
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { now, export } = args;
    let now = now.unwrap_or_else(Utc::now);

    let engine =
        EngineHandle::from_snapshot(demo_snapshot(now), Some(now), &EngineConfig::default());
    let service = &engine.service;

    println!("Lead engagement demo (as of {})", now.to_rfc3339());

    println!("\nNightly recompute");
    let report = service.recompute_all().await?;
    render_batch(&report);

    println!("\nMeeting logged for followup {ACTIVE_FOLLOWUP}");
    engine.store.insert_meeting(Meeting {
        id: MeetingId(9001),
        parent: ParentRef::followup(ACTIVE_FOLLOWUP),
        status: InteractionStatus::Completed,
        created_at: now,
        due_date: Some(now),
        summary: Some("Pricing walkthrough with procurement".to_string()),
        next_action: None,
        next_action_date: None,
        archived: false,
    })?;
    match service.recompute(Some(ACTIVE_FOLLOWUP)).await {
        TriggerOutcome::Recomputed(score) => render_score(&score),
        TriggerOutcome::NotFound(id) => println!("- Followup {id} no longer active"),
        TriggerOutcome::Failed {
            followup_id,
            reason,
        } => println!("- Recompute for followup {followup_id} failed: {reason}"),
        TriggerOutcome::Skipped => println!("- Interaction has no followup; nothing to score"),
    }

    println!("\nAction queue");
    let business = ParentRef::business(DEMO_BUSINESS);
    let next = service.next_action(business).await?;
    render_next_action(business, next.as_ref());
    render_overdue(business, &service.overdue_actions(business).await?);

    let stalled = ParentRef::followup(STALLED_FOLLOWUP);
    render_overdue(stalled, &service.overdue_actions(stalled).await?);

    if let Some(path) = export {
        engine.export(&path)?;
        println!("\nExported demo records to {}", path.display());
    }

    Ok(())
}

/// Seed data positioned relative to `now`: one engaged followup, one stalled followup, one
/// archived followup, and a business with upcoming and lapsed interactions.
pub(crate) fn demo_snapshot(now: DateTime<Utc>) -> EngagementSnapshot {
    let active = ParentRef::followup(ACTIVE_FOLLOWUP);
    let stalled = ParentRef::followup(STALLED_FOLLOWUP);
    let business = ParentRef::business(DEMO_BUSINESS);

    let followups = vec![
        Followup {
            priority: Some(Priority::High),
            notes: Some("Expansion into second warehouse".to_string()),
            next_action_date: Some(now + Duration::days(3)),
            ..Followup::new(ACTIVE_FOLLOWUP)
        },
        Followup {
            priority: Some(Priority::Medium),
            lead_score: 35,
            next_action_date: Some(now - Duration::days(2)),
            ..Followup::new(STALLED_FOLLOWUP)
        },
        Followup {
            lead_score: 80,
            followup_status: FollowupStatus::Warm,
            archived: true,
            ..Followup::new(ARCHIVED_FOLLOWUP)
        },
    ];

    let mut activities: Vec<Activity> = [2, 5, 9, 14]
        .into_iter()
        .enumerate()
        .map(|(index, age)| {
            demo_activity(index as i64 + 1, active, now - Duration::days(age), "Discovery call")
        })
        .collect();
    activities.push(Activity {
        due_date: Some(now - Duration::days(20)),
        ..demo_activity(5, stalled, now - Duration::days(45), "Send revised quote")
    });
    activities.push(Activity {
        next_action: Some("Site survey".to_string()),
        next_action_date: Some(now + Duration::days(10)),
        ..demo_activity(6, business, now - Duration::days(6), "Account review")
    });

    let meetings = vec![
        demo_meeting(1, active, now - Duration::days(3)),
        demo_meeting(2, active, now - Duration::days(10)),
        Meeting {
            next_action: Some("Quarterly business review".to_string()),
            next_action_date: Some(now + Duration::days(4)),
            ..demo_meeting(3, business, now - Duration::days(8))
        },
        Meeting {
            status: InteractionStatus::InProgress,
            due_date: Some(now - Duration::days(1)),
            ..demo_meeting(4, business, now - Duration::days(12))
        },
    ];

    EngagementSnapshot {
        followups,
        activities,
        meetings,
    }
}

fn demo_activity(id: i64, parent: ParentRef, created_at: DateTime<Utc>, detail: &str) -> Activity {
    Activity {
        id: ActivityId(id),
        parent,
        status: InteractionStatus::Pending,
        created_at,
        due_date: None,
        action_detail: Some(detail.to_string()),
        next_action: None,
        next_action_date: None,
        archived: false,
    }
}

fn demo_meeting(id: i64, parent: ParentRef, created_at: DateTime<Utc>) -> Meeting {
    Meeting {
        id: MeetingId(id),
        parent,
        status: InteractionStatus::Completed,
        created_at,
        due_date: None,
        summary: None,
        next_action: None,
        next_action_date: None,
        archived: false,
    }
}
