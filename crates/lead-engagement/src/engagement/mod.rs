//! Engagement scoring and next/overdue action resolution for sales followups.
//!
//! Scoring is a pure function of interaction counts and the followup's next action date,
//! kept apart from the store write so the rubric can be tested without a datastore. Action
//! resolution handles followups and businesses through a single tagged parent reference.

pub mod clock;
pub mod domain;
pub mod memory;
pub mod recompute;
pub mod repository;
pub mod resolver;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Activity, ActivityId, BusinessId, Followup, FollowupId, FollowupStatus, Interaction,
    InteractionKind, InteractionStatus, Meeting, MeetingId, ParentKind, ParentRef, Priority,
};
pub use memory::{EngagementSnapshot, InMemoryEngagementStore, SnapshotError};
pub use recompute::{BatchFailure, BatchReport, RecomputeSettings, ScoreRecomputer, TriggerOutcome};
pub use repository::{EngagementStore, RepositoryError, TimeoutStore};
pub use resolver::{ActionResolver, NextAction, OverdueActions};
pub use router::engagement_router;
pub use scoring::{
    EngagementScore, EngagementSignals, FollowupScore, ScoreComponent, ScoreFactor,
    ScoringConfig, ScoringEngine,
};
pub use service::{EngagementError, EngagementService};
