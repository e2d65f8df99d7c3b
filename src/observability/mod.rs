//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms for Prometheus)
//!
//! Dispatcher produces:
//!     → collector.rs (request outcomes → GatewayStats on demand)
//! ```
//!
//! # Design Decisions
//! - Structured logging with typed fields for machine parsing
//! - Metrics are cheap (atomic increments) and optional
//! - The collector is the source of truth for stats served to callers

pub mod collector;
pub mod logging;
pub mod metrics;

pub use collector::{EndpointStats, GatewayStats, MetricsCollector};
