//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! router.rs / loader / watcher produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout subscriber installed by the binary
//!     → whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing subscribers/recorders is the host's job
//! - Without a recorder every metric call is a no-op

pub mod logging;
pub mod metrics;
