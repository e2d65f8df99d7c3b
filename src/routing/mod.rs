//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, method, headers, query)
//!     → router.rs (route lookup over active rules)
//!     → matcher.rs (method, path pattern, conditions)
//!     → Return: highest-priority RouteRule or NoMatch
//!
//! Route registration:
//!     RouteConfig
//!     → rule.rs (RouteRule with timestamps)
//!     → matcher.rs (compile conditions, regexes)
//!     → appended to the table in registration order
//! ```
//!
//! # Design Decisions
//! - Deterministic: same input always matches same route
//! - Highest priority wins, earliest registration breaks ties
//! - No route is a normal outcome, not an error

pub mod matcher;
pub mod router;
pub mod rule;

pub use matcher::RequestInfo;
pub use router::RouteTable;
pub use rule::{ConditionOperator, ConditionType, RouteCondition, RouteRule};
