//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap / admin caller
//!     → services.rs (add / remove / set_active)
//!
//! Health monitor
//!     → services.rs update_health → endpoint.rs (health, latency, error rate)
//!
//! Dispatcher
//!     → services.rs mark_connection_delta / try_acquire → endpoint.rs counters
//!
//! Load balancer
//!     → services.rs get (reads only)
//! ```
//!
//! # Design Decisions
//! - Endpoints are shared as `Arc`; no caching layer between writers and readers
//! - Per-endpoint atomics instead of a global lock
//! - Removal flips the endpoint inactive so stale references stop being eligible

pub mod endpoint;
pub mod services;

pub use endpoint::{ConnectionGuard, EndpointSnapshot, HealthState, ServiceEndpoint};
pub use services::ServiceRegistry;
