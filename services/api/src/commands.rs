use crate::cli::{ParentArgs, RecomputeAllArgs, ScoreArgs, StoreArgs};
use crate::infra::{snapshot_path, EngineHandle};
use chrono::{DateTime, Utc};
use lead_engagement::config::AppConfig;
use lead_engagement::engagement::{
    BatchReport, FollowupId, FollowupScore, Interaction, NextAction, OverdueActions, ParentRef,
};
use lead_engagement::error::AppError;
use std::path::PathBuf;

fn open_engine(args: StoreArgs) -> Result<(EngineHandle, Option<PathBuf>), AppError> {
    let config = AppConfig::load()?;
    let path = snapshot_path(args.snapshot, &config.engine);
    let handle = EngineHandle::load(path.as_deref(), args.now, &config.engine)?;
    Ok((handle, path))
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let (engine, _) = open_engine(args.store)?;
    let followup_id = FollowupId(args.followup_id);

    match engine.service.compute_score(followup_id).await? {
        Some(score) => render_score(&score),
        None => println!("Followup {followup_id} not found or archived"),
    }
    Ok(())
}

pub(crate) async fn run_recompute_all(args: RecomputeAllArgs) -> Result<(), AppError> {
    let (engine, path) = open_engine(args.store)?;
    let report = engine.service.recompute_all().await?;
    render_batch(&report);

    if args.write {
        match path {
            Some(path) => {
                engine.export(&path)?;
                println!("Wrote rescored records to {}", path.display());
            }
            None => println!("No snapshot configured; nothing written"),
        }
    }
    Ok(())
}

pub(crate) async fn run_next_action(args: ParentArgs) -> Result<(), AppError> {
    let parent = args.parent();
    let (engine, _) = open_engine(args.store)?;
    let next = engine.service.next_action(parent).await?;
    render_next_action(parent, next.as_ref());
    Ok(())
}

pub(crate) async fn run_overdue(args: ParentArgs) -> Result<(), AppError> {
    let parent = args.parent();
    let (engine, _) = open_engine(args.store)?;
    let overdue = engine.service.overdue_actions(parent).await?;
    render_overdue(parent, &overdue);
    Ok(())
}

pub(crate) fn render_score(score: &FollowupScore) {
    println!(
        "- Followup {} -> score {} ({})",
        score.followup_id, score.score, score.status
    );
    for component in &score.components {
        println!(
            "    - {:?}: {:+} ({})",
            component.factor, component.points, component.notes
        );
    }
}

pub(crate) fn render_batch(report: &BatchReport) {
    println!(
        "Recomputed {} followups as of {} ({} skipped, {} failed)",
        report.scored.len(),
        report.evaluated_at.to_rfc3339(),
        report.skipped.len(),
        report.failures.len()
    );
    for score in &report.scored {
        render_score(score);
    }
    for id in &report.skipped {
        println!("- Followup {id} skipped (archived during the run)");
    }
    for failure in &report.failures {
        println!("- Followup {} failed: {}", failure.followup_id, failure.error);
    }
}

pub(crate) fn render_next_action(parent: ParentRef, next: Option<&NextAction>) {
    match next {
        Some(NextAction::Activity(activity)) => println!(
            "Next action for {parent}: activity {} on {}{}",
            activity.id,
            format_date(activity.next_action_date),
            format_note(activity.next_action.as_deref())
        ),
        Some(NextAction::Meeting(meeting)) => println!(
            "Next action for {parent}: meeting {} on {}{}",
            meeting.id,
            format_date(meeting.next_action_date),
            format_note(meeting.next_action.as_deref())
        ),
        None => println!("Next action for {parent}: No upcoming actions"),
    }
}

pub(crate) fn render_overdue(parent: ParentRef, overdue: &OverdueActions) {
    println!("Overdue actions for {parent}: {}", overdue.len());
    for activity in &overdue.overdue_activities {
        println!(
            "  - activity {} [{}] due {}",
            activity.id,
            activity.status.label(),
            format_date(activity.effective_due_date())
        );
    }
    for meeting in &overdue.overdue_meetings {
        println!(
            "  - meeting {} [{}] due {}",
            meeting.id,
            meeting.status.label(),
            format_date(meeting.effective_due_date())
        );
    }
}

fn format_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|date| date.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unscheduled".to_string())
}

fn format_note(note: Option<&str>) -> String {
    note.map(|text| format!(" ({text})")).unwrap_or_default()
}
