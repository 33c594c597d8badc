//! Routing error definitions.

use thiserror::Error;

use crate::routing::args::ArgMap;

/// Errors raised by route compilation, dispatch and reverse resolution.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Forward dispatch exhausted the table.
    #[error("No route found for {method} {path}")]
    NoRouteFound { method: String, path: String },

    /// Reverse resolution found no satisfiable route.
    #[error("No handler found for action {action} with args {args:?}")]
    NoHandlerFound { action: String, args: ArgMap },

    /// A route template is structurally invalid.
    #[error("Route file parsing error: {0}")]
    RouteFileParsing(String),

    /// A constraint or derived pattern is not a valid regular expression.
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
