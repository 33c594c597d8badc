//! HTTP-facing types.
//!
//! # Data Flow
//! ```text
//! http::Request (from the hosting framework)
//!     → request.rs (RouteRequest: method, path, query, host, format)
//!     → routing::Router::route (mutates method/format, sets action + args)
//!
//! Accept header / captured `format` arg
//!     → media.rs (MediaType parsing and inclusion)
//! ```

pub mod media;
pub mod request;

pub use media::MediaType;
pub use request::RouteRequest;
