//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each endpoint concurrently, each bounded by the timeout
//!     → registry update_health (state, latency, error rate)
//! ```
//!
//! # Design Decisions
//! - Health follows the latest probe: 2xx is healthy, anything else unhealthy
//! - Error rate decays on success and rises on failure, clamped to [0, 1]
//! - Probe failures never reach request callers; they only show in endpoint state
//! - Selection reads whatever state is current (eventual consistency)

pub mod active;

pub use active::{HealthMonitor, ProbeError};
