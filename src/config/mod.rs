//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! router.toml
//!     → loader.rs (parse & deserialize, resolve source paths)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → sources handed to Router::load
//!
//! On route file change:
//!     watcher.rs receives a notify event
//!     → Router::detect_changes reloads every source
//!     → atomic swap of the route table
//!     → ReloadEvent reported on a channel
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route files are what hot-reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{ObservabilityConfig, RequestDefaults, RouterConfig, RoutesConfig, WatchConfig};
pub use watcher::{ReloadEvent, RouteWatcher};
