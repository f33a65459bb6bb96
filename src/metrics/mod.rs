//! Metrics for the faceoff voting service
//!
//! Prometheus counters, gauges and histograms for vote processing, the
//! character roster and service health.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, RosterMetrics, ServiceMetrics, VoteMetrics};
