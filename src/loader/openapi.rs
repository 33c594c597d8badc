//! OpenAPI (and Swagger 2) documents as route sources.
//!
//! Every `paths.<path>.<method>` operation that carries an `operationId`
//! becomes one route whose action is the operation id. Declared response
//! content types (or Swagger 2 `produces`) become the route's formats, and
//! the `x-route-static-args` extension supplies static args.

use serde_yaml::Value;

use crate::http::media::MediaType;
use crate::loader::{LoadError, RouteLoader, RouteSource};
use crate::routing::route::{Route, RouteDefinition};

const OPERATION_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const STATIC_ARGS_EXTENSION: &str = "x-route-static-args";

/// Loader for OpenAPI documents in YAML or JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApiLoader;

impl RouteLoader for OpenApiLoader {
    fn load(&self, source: &dyn RouteSource) -> Result<Vec<Route>, LoadError> {
        let content = source.read()?;
        let document = parse_document(source.name(), &content)?;
        routes_from_document(source.name(), &document)
    }
}

fn parse_document(name: &str, content: &str) -> Result<Value, LoadError> {
    let is_json = std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    // JSON goes through serde_json so error positions point at JSON syntax,
    // but lands in the same ordered value tree as YAML.
    let parsed = if is_json {
        serde_json::from_str::<Value>(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| LoadError::OpenApi {
        name: name.to_string(),
        message,
    })
}

/// Build routes from an already parsed document, in document order.
pub fn routes_from_document(name: &str, document: &Value) -> Result<Vec<Route>, LoadError> {
    let paths = document
        .get("paths")
        .and_then(Value::as_mapping)
        .ok_or_else(|| LoadError::OpenApi {
            name: name.to_string(),
            message: "missing `paths` object".to_string(),
        })?;

    let mut routes = Vec::new();
    for (path, item) in paths {
        let (Some(path), Some(item)) = (path.as_str(), item.as_mapping()) else {
            continue;
        };
        for (method, operation) in item {
            let Some(method) = method.as_str() else {
                continue;
            };
            if !OPERATION_METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                continue;
            }
            let Some(operation_id) = operation.get("operationId").and_then(Value::as_str) else {
                tracing::debug!(source = name, path, method, "Skipping operation without operationId");
                continue;
            };

            let mut definition =
                RouteDefinition::new(method, path, operation_id).with_origin(name, None);
            for format in response_formats(operation) {
                definition = definition.with_format(format);
            }
            if let Some(static_args) = operation.get(STATIC_ARGS_EXTENSION).and_then(Value::as_mapping) {
                for (key, value) in static_args {
                    if let (Some(key), Some(value)) = (key.as_str(), scalar(value)) {
                        definition = definition.with_static_arg(key, value);
                    }
                }
            }

            let route = definition.compile().map_err(|source| LoadError::Route {
                name: name.to_string(),
                location: format!("{} {path}", method.to_ascii_uppercase()),
                source,
            })?;
            routes.push(route);
        }
    }
    Ok(routes)
}

fn response_formats(operation: &Value) -> Vec<MediaType> {
    let mut declared: Vec<&str> = Vec::new();

    if let Some(responses) = operation.get("responses").and_then(Value::as_mapping) {
        for response in responses.values() {
            if let Some(content) = response.get("content").and_then(Value::as_mapping) {
                declared.extend(content.keys().filter_map(Value::as_str));
            }
        }
    }
    if let Some(produces) = operation.get("produces").and_then(Value::as_sequence) {
        declared.extend(produces.iter().filter_map(Value::as_str));
    }

    let mut formats: Vec<MediaType> = Vec::new();
    for media in declared.into_iter().filter_map(MediaType::parse) {
        if !formats.contains(&media) {
            formats.push(media);
        }
    }
    formats
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
