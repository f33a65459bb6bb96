//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the faceoff voting service
//! using Prometheus metrics.

use crate::types::Outcome;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the voting service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Vote transaction metrics
    vote_metrics: VoteMetrics,

    /// Character roster metrics
    roster_metrics: RosterMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Vote transaction metrics
#[derive(Clone)]
pub struct VoteMetrics {
    /// Votes committed, by outcome
    pub votes_total: IntCounterVec,

    /// Votes rejected or aborted, by stage
    pub vote_failures_total: IntCounterVec,

    /// Votes aborted after at least one write took effect
    pub partial_writes_total: IntCounter,

    /// End-to-end vote processing time
    pub vote_duration: Histogram,
}

/// Character roster metrics
#[derive(Clone)]
pub struct RosterMetrics {
    /// Characters registered since start
    pub characters_registered_total: IntCounter,

    /// Characters currently known to the store
    pub characters: IntGauge,

    /// Matchup requests, by availability
    pub matchups_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let vote_metrics = VoteMetrics::new(&registry)?;
        let roster_metrics = RosterMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            vote_metrics,
            roster_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get vote metrics
    pub fn votes(&self) -> &VoteMetrics {
        &self.vote_metrics
    }

    /// Get roster metrics
    pub fn roster(&self) -> &RosterMetrics {
        &self.roster_metrics
    }

    /// Record a committed vote
    pub fn record_vote(&self, outcome: Outcome, duration: Duration) {
        self.vote_metrics
            .votes_total
            .with_label_values(&[outcome.as_str()])
            .inc();

        self.vote_metrics
            .vote_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a vote that did not complete
    pub fn record_vote_failure(&self, stage: &str, partial: bool) {
        self.vote_metrics
            .vote_failures_total
            .with_label_values(&[stage])
            .inc();

        if partial {
            self.vote_metrics.partial_writes_total.inc();
        }
    }

    /// Record a newly registered character
    pub fn record_character_registered(&self) {
        self.roster_metrics.characters_registered_total.inc();
        self.roster_metrics.characters.inc();
    }

    /// Set the number of characters known to the store
    pub fn set_character_count(&self, count: usize) {
        self.roster_metrics.characters.set(count as i64);
    }

    /// Record a matchup request
    pub fn record_matchup(&self, available: bool) {
        let status = if available { "available" } else { "unavailable" };

        self.roster_metrics
            .matchups_total
            .with_label_values(&[status])
            .inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let health_status = IntGauge::new(
            "faceoff_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("faceoff_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            health_status,
            component_health,
        })
    }
}

impl VoteMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let votes_total = IntCounterVec::new(
            Opts::new("faceoff_votes_total", "Total votes committed"),
            &["outcome"],
        )?;
        registry.register(Box::new(votes_total.clone()))?;

        let vote_failures_total = IntCounterVec::new(
            Opts::new("faceoff_vote_failures_total", "Total votes not committed"),
            &["stage"],
        )?;
        registry.register(Box::new(vote_failures_total.clone()))?;

        let partial_writes_total = IntCounter::new(
            "faceoff_vote_partial_writes_total",
            "Votes aborted after some writes took effect",
        )?;
        registry.register(Box::new(partial_writes_total.clone()))?;

        let vote_duration = Histogram::with_opts(
            HistogramOpts::new(
                "faceoff_vote_duration_seconds",
                "Time spent processing a vote",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(vote_duration.clone()))?;

        Ok(Self {
            votes_total,
            vote_failures_total,
            partial_writes_total,
            vote_duration,
        })
    }
}

impl RosterMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let characters_registered_total = IntCounter::new(
            "faceoff_characters_registered_total",
            "Total characters registered",
        )?;
        registry.register(Box::new(characters_registered_total.clone()))?;

        let characters = IntGauge::new("faceoff_characters", "Characters in the store")?;
        registry.register(Box::new(characters.clone()))?;

        let matchups_total = IntCounterVec::new(
            Opts::new("faceoff_matchups_total", "Total matchup requests"),
            &["status"],
        )?;
        registry.register(Box::new(matchups_total.clone()))?;

        Ok(Self {
            characters_registered_total,
            characters,
            matchups_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
