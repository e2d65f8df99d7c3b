//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → bootstrap registers services and routes into the Gateway
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the gateway is mutated through its API afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AdminConfig;
pub use schema::GatewayConfig;
pub use schema::LoadBalancerConfig;
pub use schema::LoadBalancerStrategy;
pub use schema::ObservabilityConfig;
pub use schema::RouteConfig;
pub use schema::ServiceConfig;
