mod config;
mod rules;

pub use config::ScoringConfig;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{FollowupId, FollowupStatus};

/// Facts about a followup that the score is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngagementSignals {
    pub recent_activities: u64,
    pub recent_meetings: u64,
    pub next_action_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    RecentActivities,
    RecentMeetings,
    UpcomingAction,
    OverdueAction,
}

/// Discrete contribution to a score, kept so the total can be audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: i32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementScore {
    pub score: i32,
    pub status: FollowupStatus,
    pub components: Vec<ScoreComponent>,
}

/// Persisted result of scoring a single followup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupScore {
    pub followup_id: FollowupId,
    pub score: i32,
    pub status: FollowupStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ScoreComponent>,
}

/// Stateless evaluator applying the rubric to engagement signals. Never touches storage.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Lower bound (exclusive) on creation time for an interaction to count as recent.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.config.lookback_days)
    }

    pub fn score(&self, signals: &EngagementSignals, now: DateTime<Utc>) -> EngagementScore {
        let (components, score) = rules::score_signals(signals, &self.config, now);

        EngagementScore {
            score,
            status: self.classify(score),
            components,
        }
    }

    pub fn classify(&self, score: i32) -> FollowupStatus {
        rules::classify(score, &self.config)
    }
}
