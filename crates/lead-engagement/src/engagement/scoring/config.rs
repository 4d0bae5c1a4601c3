use serde::{Deserialize, Serialize};

/// Rubric weights for the engagement score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub lookback_days: i64,
    pub activity_points: i32,
    pub activity_cap: i32,
    pub meeting_points: i32,
    pub meeting_cap: i32,
    pub upcoming_action_bonus: i32,
    pub overdue_action_penalty: i32,
    pub hot_threshold: i32,
    pub warm_threshold: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            activity_points: 10,
            activity_cap: 50,
            meeting_points: 15,
            meeting_cap: 60,
            upcoming_action_bonus: 20,
            overdue_action_penalty: 10,
            hot_threshold: 100,
            warm_threshold: 50,
        }
    }
}
