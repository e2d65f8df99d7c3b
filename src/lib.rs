//! API gateway core library.
//!
//! Service registry, route table, load balancing, active health checking and
//! request metrics behind a single [`Gateway`] facade. Proxying itself lives
//! in the caller; this crate only decides where a request should go.

pub mod admin;
pub mod config;
pub mod error;
pub mod gateway;
pub mod health;
pub mod load_balancer;
pub mod observability;
pub mod registry;
pub mod routing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::{Gateway, Resolution};
