//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route compilation (load time):
//!     RouteDefinition (method, [host]path, action, static args, formats)
//!     → pattern.rs (tokenize templates, build path/host/action regexes)
//!     → route.rs (Route + request guard from matcher.rs)
//!     → router.rs (RouteTable, swapped atomically)
//!
//! Forward (request time):
//!     RouteRequest
//!     → router.rs (method override, context path, first match wins)
//!     → matcher.rs (method, format, host conditions)
//!     → Route + bound args, or NoRouteFound
//!
//! Reverse:
//!     action id + ArgMap
//!     → reverse.rs (action pattern, arg binding, static arg checks)
//!     → ActionDefinition (url, method, host) or NoHandlerFound
//! ```
//!
//! # Design Decisions
//! - Routes are compiled once and immutable; reloads replace the whole table
//! - Deterministic: same table and input always yield the same route
//! - First match wins (declaration order)

pub mod args;
pub mod error;
pub mod matcher;
pub mod pattern;
pub mod reverse;
pub mod route;
pub mod router;

pub use args::{arg_map, ArgMap, ArgValue};
pub use error::{RoutingError, RoutingResult};
pub use pattern::{compile, Arg, CompiledRoute};
pub use reverse::ActionDefinition;
pub use route::{Route, RouteDefinition, RouteOrigin};
pub use router::{RouteTable, Router};
