//! Line-oriented route files.
//!
//! One route per line:
//!
//! ```text
//! # comment
//! GET     /users/{<[0-9]+>id}          Users.show
//! GET     {client}.example.com/home    Home.index
//! GET     /feed                         Feed.show     {format:'json'}
//! POST    /upload                       Files.upload  (multipart/form-data)
//! ```
//!
//! Static args (`{key:'value', ...}`) come before the optional format list.

use crate::http::media::MediaType;
use crate::loader::{LoadError, RouteLoader, RouteSource};
use crate::routing::route::{Route, RouteDefinition};

/// Loader for the line-oriented route DSL.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByLineLoader;

impl RouteLoader for ByLineLoader {
    fn load(&self, source: &dyn RouteSource) -> Result<Vec<Route>, LoadError> {
        let content = source.read()?;
        parse_routes(source.name(), &content)
    }
}

/// Parse a whole route file.
pub fn parse_routes(name: &str, content: &str) -> Result<Vec<Route>, LoadError> {
    let mut routes = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = index + 1;

        let definition = parse_line(line)
            .map_err(|message| LoadError::Syntax {
                name: name.to_string(),
                line: number,
                message,
            })?
            .with_origin(name, Some(number));

        let route = definition.compile().map_err(|source| LoadError::Route {
            name: name.to_string(),
            location: format!("line {number}"),
            source,
        })?;
        routes.push(route);
    }
    Ok(routes)
}

fn parse_line(line: &str) -> Result<RouteDefinition, String> {
    let (method, rest) = next_token(line).ok_or_else(|| "missing method".to_string())?;
    if method != "*" && !method.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("invalid method `{method}`"));
    }
    let (path, rest) = next_token(rest).ok_or_else(|| "missing path".to_string())?;
    let (action, rest) = next_token(rest).ok_or_else(|| "missing action".to_string())?;

    let mut definition = RouteDefinition::new(method, path, action);
    let mut rest = rest.trim_start();

    if let Some(body) = rest.strip_prefix('{') {
        let end = body
            .find('}')
            .ok_or_else(|| "unterminated static args".to_string())?;
        for (key, value) in parse_static_args(&body[..end])? {
            definition = definition.with_static_arg(key, value);
        }
        rest = body[end + 1..].trim_start();
    }

    if let Some(body) = rest.strip_prefix('(') {
        let end = body
            .find(')')
            .ok_or_else(|| "unterminated format list".to_string())?;
        for item in body[..end].split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let format =
                MediaType::from_format(item).ok_or_else(|| format!("invalid format `{item}`"))?;
            definition = definition.with_format(format);
        }
        rest = body[end + 1..].trim_start();
    }

    if !rest.is_empty() && !rest.starts_with('#') {
        return Err(format!("unexpected trailing input `{rest}`"));
    }
    Ok(definition)
}

fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

fn parse_static_args(body: &str) -> Result<Vec<(String, String)>, String> {
    let mut args = Vec::new();
    for pair in body.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| format!("static arg `{pair}` is not key:value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("static arg `{pair}` has no key"));
        }
        args.push((key.to_string(), unquote(value.trim()).to_string()));
    }
    Ok(args)
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
