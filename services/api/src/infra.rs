use chrono::{DateTime, Utc};
use lead_engagement::config::EngineConfig;
use lead_engagement::engagement::{
    Clock, EngagementService, EngagementSnapshot, FixedClock, InMemoryEngagementStore,
    ScoringConfig, SystemClock, TimeoutStore,
};
use lead_engagement::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type EngineStore = TimeoutStore<InMemoryEngagementStore>;
pub(crate) type Engine = EngagementService<EngineStore>;

/// In-memory store plus the service wired on top of it. The raw store is kept for seeding
/// interactions and exporting snapshots.
pub(crate) struct EngineHandle {
    pub(crate) store: Arc<InMemoryEngagementStore>,
    pub(crate) service: Arc<Engine>,
}

impl EngineHandle {
    pub(crate) fn from_snapshot(
        snapshot: EngagementSnapshot,
        now: Option<DateTime<Utc>>,
        config: &EngineConfig,
    ) -> Self {
        let store = Arc::new(InMemoryEngagementStore::from_snapshot(snapshot));
        let bounded = Arc::new(TimeoutStore::new(store.clone(), config.store_timeout));
        let service = Arc::new(EngagementService::with_settings(
            bounded,
            clock_for(now),
            ScoringConfig::default(),
            config.recompute_settings(),
        ));

        Self { store, service }
    }

    /// Loads the snapshot at `path`, or starts empty when no path is given.
    pub(crate) fn load(
        path: Option<&Path>,
        now: Option<DateTime<Utc>>,
        config: &EngineConfig,
    ) -> Result<Self, AppError> {
        let snapshot = match path {
            Some(path) => EngagementSnapshot::from_path(path)?,
            None => EngagementSnapshot::default(),
        };
        Ok(Self::from_snapshot(snapshot, now, config))
    }

    pub(crate) fn export(&self, path: &Path) -> Result<(), AppError> {
        self.store.snapshot()?.write_to_path(path)?;
        Ok(())
    }
}

pub(crate) fn clock_for(now: Option<DateTime<Utc>>) -> Arc<dyn Clock> {
    match now {
        Some(instant) => Arc::new(FixedClock::new(instant)),
        None => Arc::new(SystemClock),
    }
}

pub(crate) fn snapshot_path(explicit: Option<PathBuf>, config: &EngineConfig) -> Option<PathBuf> {
    explicit.or_else(|| config.snapshot_path.clone())
}

pub(crate) fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
