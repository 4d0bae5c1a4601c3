use chrono::{DateTime, Utc};

use super::super::domain::FollowupStatus;
use super::config::ScoringConfig;
use super::{EngagementSignals, ScoreComponent, ScoreFactor};

fn capped_points(count: u64, points: i32, cap: i32) -> i32 {
    let raw = i64::try_from(count)
        .unwrap_or(i64::MAX)
        .saturating_mul(i64::from(points));
    raw.clamp(i64::from(i32::MIN), i64::from(cap)) as i32
}

pub(crate) fn score_signals(
    signals: &EngagementSignals,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> (Vec<ScoreComponent>, i32) {
    let mut components = Vec::new();
    let mut total_score: i32 = 0;

    let activity_points = capped_points(
        signals.recent_activities,
        config.activity_points,
        config.activity_cap,
    );
    components.push(ScoreComponent {
        factor: ScoreFactor::RecentActivities,
        points: activity_points,
        notes: format!(
            "{} activit{} in the last {} days (cap {})",
            signals.recent_activities,
            if signals.recent_activities == 1 { "y" } else { "ies" },
            config.lookback_days,
            config.activity_cap
        ),
    });
    total_score = total_score.saturating_add(activity_points);

    let meeting_points = capped_points(
        signals.recent_meetings,
        config.meeting_points,
        config.meeting_cap,
    );
    components.push(ScoreComponent {
        factor: ScoreFactor::RecentMeetings,
        points: meeting_points,
        notes: format!(
            "{} meeting(s) in the last {} days (cap {})",
            signals.recent_meetings, config.lookback_days, config.meeting_cap
        ),
    });
    total_score = total_score.saturating_add(meeting_points);

    match signals.next_action_date {
        Some(date) if date > now => {
            components.push(ScoreComponent {
                factor: ScoreFactor::UpcomingAction,
                points: config.upcoming_action_bonus,
                notes: format!("next action scheduled for {}", date.to_rfc3339()),
            });
            total_score = total_score.saturating_add(config.upcoming_action_bonus);
        }
        Some(date) if date < now => {
            components.push(ScoreComponent {
                factor: ScoreFactor::OverdueAction,
                points: 0i32.saturating_sub(config.overdue_action_penalty),
                notes: format!("next action overdue since {}", date.to_rfc3339()),
            });
            total_score = total_score.saturating_sub(config.overdue_action_penalty);
        }
        // A next action falling exactly on `now` is neither upcoming nor overdue.
        _ => {}
    }

    (components, total_score)
}

pub(crate) fn classify(score: i32, config: &ScoringConfig) -> FollowupStatus {
    if score >= config.hot_threshold {
        FollowupStatus::Hot
    } else if score >= config.warm_threshold {
        FollowupStatus::Warm
    } else {
        FollowupStatus::Cold
    }
}
