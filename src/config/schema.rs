//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::http::media::MediaType;
use crate::http::request::RouteRequest;
use crate::loader::FileSource;

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Route sources, in precedence order.
    pub routes: RoutesConfig,

    /// Hot reload of route sources.
    pub watch: WatchConfig,

    /// Request defaults used for lookups made outside a live request.
    pub request: RequestDefaults,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Route source list.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutesConfig {
    /// Route files. Earlier files win over later ones.
    pub sources: Vec<PathBuf>,
}

impl RoutesConfig {
    pub fn file_sources(&self) -> Vec<FileSource> {
        self.sources.iter().map(FileSource::new).collect()
    }
}

/// Watch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,

    /// Poll interval for backends without native file events.
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 2,
        }
    }
}

/// Defaults describing the "current request" for CLI lookups and reverse routing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Application mount point, e.g. `/app`.
    pub context_path: String,

    pub servlet_path: String,

    pub host: String,

    /// Explicit port; omitted from URLs when it is the scheme default.
    pub port: Option<u16>,

    pub secure: bool,

    /// Negotiated format name (`json`) or media type (`application/json`).
    pub format: Option<String>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            context_path: String::new(),
            servlet_path: String::new(),
            host: "localhost".to_string(),
            port: None,
            secure: false,
            format: None,
        }
    }
}

impl RequestDefaults {
    /// Build a request carrying these defaults.
    pub fn to_request(&self, method: &str, path: &str) -> RouteRequest {
        let mut request = RouteRequest::new(method, path)
            .with_context_path(self.context_path.as_str())
            .with_servlet_path(self.servlet_path.as_str())
            .with_host(self.host.as_str())
            .with_secure(self.secure);
        if let Some(port) = self.port {
            request = request.with_port(port);
        }
        if let Some(format) = self.format.as_deref().and_then(MediaType::from_format) {
            request = request.with_format(format);
        }
        request
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
