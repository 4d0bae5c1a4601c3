use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{FollowupId, InteractionKind, ParentRef};
use super::repository::{EngagementStore, RepositoryError};
use super::scoring::{EngagementSignals, FollowupScore, ScoringEngine};
use super::service::EngagementError;

/// Limits applied to triggered and batch recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeSettings {
    pub trigger_timeout: Duration,
    pub batch_concurrency: usize,
}

impl Default for RecomputeSettings {
    fn default() -> Self {
        Self {
            trigger_timeout: Duration::from_secs(10),
            batch_concurrency: 8,
        }
    }
}

/// Result of the recompute hook run after an interaction is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The interaction had no followup parent.
    Skipped,
    Recomputed(FollowupScore),
    NotFound(FollowupId),
    Failed {
        followup_id: FollowupId,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub followup_id: FollowupId,
    pub error: String,
}

/// Outcome of recomputing every non-archived followup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub evaluated_at: DateTime<Utc>,
    pub scored: Vec<FollowupScore>,
    /// Followups that disappeared or were archived while the batch ran.
    pub skipped: Vec<FollowupId>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_partial_failure(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Reads engagement signals, scores them, and writes the result back to the store.
pub struct ScoreRecomputer<S: ?Sized> {
    store: Arc<S>,
    engine: ScoringEngine,
    settings: RecomputeSettings,
}

impl<S> ScoreRecomputer<S>
where
    S: EngagementStore + ?Sized,
{
    pub fn new(store: Arc<S>, engine: ScoringEngine, settings: RecomputeSettings) -> Self {
        Self {
            store,
            engine,
            settings,
        }
    }

    /// Scores a followup as of `now` and persists it. `Ok(None)` means the followup is
    /// unknown or archived.
    pub async fn compute_score(
        &self,
        followup_id: FollowupId,
        now: DateTime<Utc>,
    ) -> Result<Option<FollowupScore>, EngagementError> {
        let Some(followup) = self.store.followup(followup_id).await? else {
            debug!(%followup_id, "followup not found; nothing to score");
            return Ok(None);
        };

        let parent = ParentRef::followup(followup_id);
        let created_after = self.engine.window_start(now);
        let (recent_activities, recent_meetings) = tokio::try_join!(
            self.store
                .count_created_between(InteractionKind::Activity, parent, created_after, now),
            self.store
                .count_created_between(InteractionKind::Meeting, parent, created_after, now),
        )?;

        let signals = EngagementSignals {
            recent_activities,
            recent_meetings,
            next_action_date: followup.next_action_date,
        };
        let scored = self.engine.score(&signals, now);

        match self
            .store
            .update_followup_score(followup_id, scored.score, scored.status)
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => {
                debug!(%followup_id, "followup archived before its score was written");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            %followup_id,
            score = scored.score,
            status = %scored.status,
            "followup score recomputed"
        );

        Ok(Some(FollowupScore {
            followup_id,
            score: scored.score,
            status: scored.status,
            components: scored.components,
        }))
    }

    /// Never returns an error: failures are logged and reported in the outcome so the
    /// interaction that triggered the recompute stays committed.
    pub async fn on_action_created(
        &self,
        followup_id: Option<FollowupId>,
        now: DateTime<Utc>,
    ) -> TriggerOutcome {
        let Some(followup_id) = followup_id else {
            return TriggerOutcome::Skipped;
        };

        let limit = self.settings.trigger_timeout;
        match tokio::time::timeout(limit, self.compute_score(followup_id, now)).await {
            Ok(Ok(Some(score))) => TriggerOutcome::Recomputed(score),
            Ok(Ok(None)) => {
                warn!(%followup_id, "interaction created against unknown followup");
                TriggerOutcome::NotFound(followup_id)
            }
            Ok(Err(err)) => {
                warn!(%followup_id, error = %err, "score recompute failed after interaction create");
                TriggerOutcome::Failed {
                    followup_id,
                    reason: err.to_string(),
                }
            }
            Err(_) => {
                warn!(
                    %followup_id,
                    timeout_ms = limit.as_millis() as u64,
                    "score recompute timed out after interaction create"
                );
                TriggerOutcome::Failed {
                    followup_id,
                    reason: format!("recompute timed out after {}ms", limit.as_millis()),
                }
            }
        }
    }

    /// Scores every non-archived followup with bounded concurrency. Only a failure to list
    /// the followups is returned as an error.
    pub async fn recompute_all(&self, now: DateTime<Utc>) -> Result<BatchReport, EngagementError> {
        let followups = self.store.non_archived_followups().await?;
        let total = followups.len();
        let concurrency = self.settings.batch_concurrency.max(1);

        let mut results: Vec<(FollowupId, Result<Option<FollowupScore>, EngagementError>)> =
            stream::iter(followups.into_iter().map(|followup| followup.id))
                .map(|followup_id| async move {
                    (followup_id, self.compute_score(followup_id, now).await)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        results.sort_by_key(|(followup_id, _)| *followup_id);

        let mut report = BatchReport {
            evaluated_at: now,
            scored: Vec::with_capacity(total),
            skipped: Vec::new(),
            failures: Vec::new(),
        };

        for (followup_id, result) in results {
            match result {
                Ok(Some(score)) => report.scored.push(score),
                Ok(None) => report.skipped.push(followup_id),
                Err(err) => {
                    warn!(%followup_id, error = %err, "followup skipped by batch recompute");
                    report.failures.push(BatchFailure {
                        followup_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            total,
            scored = report.scored.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "batch score recompute finished"
        );

        Ok(report)
    }
}
