//! Route definition loading.
//!
//! # Data Flow
//! ```text
//! RouteSource (file on disk, in-memory text)
//!     → loader_for(name) picks a loader by extension
//!         .yml / .yaml / .json → openapi.rs
//!         anything else        → by_line.rs
//!     → Vec<Route> (compiled, in declaration order)
//!     → Router::load swaps the table atomically
//! ```
//!
//! # Design Decisions
//! - Sources are read outside any lock; the router only sees finished tables
//! - A failing source aborts the whole load; the previous table stays live
//! - `last_modified` drives change detection, never partial reloads

pub mod by_line;
pub mod openapi;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

use crate::routing::error::RoutingError;
use crate::routing::route::Route;

pub use by_line::ByLineLoader;
pub use openapi::OpenApiLoader;

/// Extensions handled by the OpenAPI loader.
const OPENAPI_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// Errors raised while loading route sources.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read route source {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}:{line}: {message}")]
    Syntax {
        name: String,
        line: usize,
        message: String,
    },

    #[error("{name} ({location}): {source}")]
    Route {
        name: String,
        location: String,
        #[source]
        source: RoutingError,
    },

    #[error("Invalid OpenAPI document {name}: {message}")]
    OpenApi { name: String, message: String },
}

/// Abstract content source for route definitions.
pub trait RouteSource: Send + Sync {
    /// Name used for loader selection and error messages (usually a path).
    fn name(&self) -> &str;

    fn read(&self) -> Result<String, LoadError>;

    fn last_modified(&self) -> Result<SystemTime, LoadError>;

    /// Backing file, if any. Used by the watcher.
    fn path(&self) -> Option<&Path> {
        None
    }
}

impl<T: RouteSource + ?Sized> RouteSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&self) -> Result<String, LoadError> {
        (**self).read()
    }

    fn last_modified(&self) -> Result<SystemTime, LoadError> {
        (**self).last_modified()
    }

    fn path(&self) -> Option<&Path> {
        (**self).path()
    }
}

/// A route file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl RouteSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<String, LoadError> {
        fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            name: self.name.clone(),
            source,
        })
    }

    fn last_modified(&self) -> Result<SystemTime, LoadError> {
        fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|source| LoadError::Io {
                name: self.name.clone(),
                source,
            })
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Route definitions held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    content: String,
    modified: SystemTime,
}

impl MemorySource {
    /// `name` selects the loader, so give it the extension of the format.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            modified: SystemTime::now(),
        }
    }

    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = modified;
        self
    }
}

impl RouteSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<String, LoadError> {
        Ok(self.content.clone())
    }

    fn last_modified(&self) -> Result<SystemTime, LoadError> {
        Ok(self.modified)
    }
}

/// Turns one source into compiled routes.
pub trait RouteLoader {
    fn load(&self, source: &dyn RouteSource) -> Result<Vec<Route>, LoadError>;
}

/// True if `name` should be read as an OpenAPI document.
pub fn is_openapi(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            OPENAPI_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Select a loader by file extension.
pub fn loader_for(name: &str) -> Box<dyn RouteLoader> {
    if is_openapi(name) {
        Box::new(OpenApiLoader)
    } else {
        Box::new(ByLineLoader)
    }
}

/// Parse one source with the loader its name selects.
pub fn parse(source: &dyn RouteSource) -> Result<Vec<Route>, LoadError> {
    let routes = loader_for(source.name()).load(source)?;
    tracing::debug!(source = source.name(), routes = routes.len(), "Parsed route source");
    Ok(routes)
}
