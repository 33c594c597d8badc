//! Media types for content negotiation.
//!
//! # Responsibilities
//! - Parse `type/subtype` strings (parameters are ignored)
//! - Resolve short format names (`json`, `html`) to media types
//! - Decide inclusion between a requested type and a declared one
//!
//! # Design Decisions
//! - Type and subtype are normalized to lowercase
//! - `*/*` includes everything; `type/*` includes every subtype of `type`
//! - `type/*+suffix` includes only subtypes carrying the same suffix

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

const WILDCARD: &str = "*";

/// A `type/subtype` media type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    kind: String,
    subtype: String,
}

impl MediaType {
    /// Create a media type from its two halves.
    pub fn new(kind: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            kind: kind.into().to_ascii_lowercase(),
            subtype: subtype.into().to_ascii_lowercase(),
        }
    }

    /// `*/*`
    pub fn all() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// Parse a `type/subtype[;params]` string. A bare `*` is read as `*/*`.
    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        if essence == WILDCARD {
            return Some(Self::all());
        }
        let (kind, subtype) = essence.split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
            return None;
        }
        if kind == WILDCARD && subtype != WILDCARD {
            return None;
        }
        Some(Self::new(kind, subtype))
    }

    /// Resolve a format name as written in route files or captured from a
    /// path (`json`, `xml`, `html`...). Full media types are accepted as-is.
    pub fn from_format(format: &str) -> Option<Self> {
        let format = format.trim();
        if format.is_empty() {
            return None;
        }
        if format.contains('/') {
            return Self::parse(format);
        }
        let resolved = match format.to_ascii_lowercase().as_str() {
            "html" | "htm" => Self::new("text", "html"),
            "txt" | "text" => Self::new("text", "plain"),
            "css" => Self::new("text", "css"),
            "csv" => Self::new("text", "csv"),
            "js" => Self::new("application", "javascript"),
            "json" => Self::new("application", "json"),
            "xml" => Self::new("application", "xml"),
            "atom" => Self::new("application", "atom+xml"),
            "rss" => Self::new("application", "rss+xml"),
            "yaml" | "yml" => Self::new("application", "yaml"),
            "pdf" => Self::new("application", "pdf"),
            other => Self::new("application", other),
        };
        Some(resolved)
    }

    /// The primary type (`application` in `application/json`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn is_wildcard_type(&self) -> bool {
        self.kind == WILDCARD
    }

    pub fn is_wildcard_subtype(&self) -> bool {
        self.subtype == WILDCARD || self.subtype.starts_with("*+")
    }

    /// Returns true if `other` is covered by this media type.
    pub fn includes(&self, other: &MediaType) -> bool {
        if self.is_wildcard_type() {
            return true;
        }
        if self.kind != other.kind {
            return false;
        }
        if self.subtype == other.subtype || self.subtype == WILDCARD {
            return true;
        }
        // `application/*+xml` covers `application/atom+xml`
        match (self.subtype.strip_prefix("*+"), other.subtype.rsplit_once('+')) {
            (Some(suffix), Some((_, other_suffix))) => suffix == other_suffix,
            _ => false,
        }
    }

    /// Render a list the way route tables print it.
    pub fn join(types: &[MediaType]) -> String {
        types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid media type: {s}"))
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
