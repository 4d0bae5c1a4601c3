use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::clock::Clock;
use super::domain::{FollowupId, ParentRef};
use super::recompute::{BatchReport, RecomputeSettings, ScoreRecomputer, TriggerOutcome};
use super::repository::{EngagementStore, RepositoryError};
use super::resolver::{ActionResolver, NextAction, OverdueActions};
use super::scoring::{FollowupScore, ScoringConfig, ScoringEngine};

/// Entry point used by the application layer. Every call reads the clock exactly once and
/// threads that instant through all of its comparisons.
pub struct EngagementService<S: ?Sized> {
    clock: Arc<dyn Clock>,
    recomputer: ScoreRecomputer<S>,
    resolver: ActionResolver<S>,
}

impl<S> EngagementService<S>
where
    S: EngagementStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: ScoringConfig) -> Self {
        Self::with_settings(store, clock, config, RecomputeSettings::default())
    }

    pub fn with_settings(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        config: ScoringConfig,
        settings: RecomputeSettings,
    ) -> Self {
        let engine = ScoringEngine::new(config);
        Self {
            clock,
            recomputer: ScoreRecomputer::new(store.clone(), engine, settings),
            resolver: ActionResolver::new(store),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Recompute hook invoked after an activity or meeting is created.
    pub async fn recompute(&self, followup_id: Option<FollowupId>) -> TriggerOutcome {
        self.recomputer.on_action_created(followup_id, self.now()).await
    }

    pub async fn compute_score(
        &self,
        followup_id: FollowupId,
    ) -> Result<Option<FollowupScore>, EngagementError> {
        self.compute_score_at(followup_id, self.now()).await
    }

    pub async fn compute_score_at(
        &self,
        followup_id: FollowupId,
        now: DateTime<Utc>,
    ) -> Result<Option<FollowupScore>, EngagementError> {
        self.recomputer.compute_score(followup_id, now).await
    }

    pub async fn recompute_all(&self) -> Result<BatchReport, EngagementError> {
        self.recompute_all_at(self.now()).await
    }

    pub async fn recompute_all_at(&self, now: DateTime<Utc>) -> Result<BatchReport, EngagementError> {
        self.recomputer.recompute_all(now).await
    }

    pub async fn next_action(
        &self,
        parent: ParentRef,
    ) -> Result<Option<NextAction>, EngagementError> {
        self.next_action_at(parent, self.now()).await
    }

    pub async fn next_action_at(
        &self,
        parent: ParentRef,
        now: DateTime<Utc>,
    ) -> Result<Option<NextAction>, EngagementError> {
        Ok(self.resolver.next_action(parent, now).await?)
    }

    pub async fn overdue_actions(
        &self,
        parent: ParentRef,
    ) -> Result<OverdueActions, EngagementError> {
        self.overdue_actions_at(parent, self.now()).await
    }

    pub async fn overdue_actions_at(
        &self,
        parent: ParentRef,
        now: DateTime<Utc>,
    ) -> Result<OverdueActions, EngagementError> {
        Ok(self.resolver.overdue_actions(parent, now).await?)
    }
}

/// Error raised by the engagement service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngagementError {
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}
