//! Action router library.
//!
//! Maps HTTP requests to action identifiers (forward routing) and action
//! identifiers plus arguments back to URLs (reverse routing), over a route
//! table that can be reloaded while requests are being served.

// Core subsystems
pub mod config;
pub mod http;
pub mod loader;
pub mod routing;

// Cross-cutting concerns
pub mod observability;

pub use config::schema::RouterConfig;
pub use http::{MediaType, RouteRequest};
pub use loader::{FileSource, LoadError, MemorySource, RouteSource};
pub use routing::{arg_map, ActionDefinition, ArgMap, ArgValue, Route, RouteDefinition, Router, RoutingError};
