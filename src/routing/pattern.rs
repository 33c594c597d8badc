//! Route template compilation.
//!
//! # Responsibilities
//! - Split an optional host template off the path template
//! - Tokenize `{name}` and `{<constraint>name}` placeholders
//! - Build the path, host and action patterns once per route
//! - Render templates back into concrete URLs
//!
//! # Design Decisions
//! - `compile` is a pure function: same templates, same `CompiledRoute`
//! - Literal path text stays regex-active (`/?` means an optional slash)
//! - Literal action text is escaped; only placeholders naming a route
//!   argument become capture groups
//! - Host patterns are case-insensitive, path patterns are not

use std::collections::HashMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use url::form_urlencoded::byte_serialize;

use crate::routing::args::is_deferred;
use crate::routing::error::{RoutingError, RoutingResult};

/// Constraint applied to `{name}` path placeholders.
pub const DEFAULT_PATH_CONSTRAINT: &str = "[^/]+";

/// Constraint applied to the host placeholder.
pub const HOST_CONSTRAINT: &str = ".*";

/// Optional trailing slash marker dropped when rendering.
const OPTIONAL_SLASH: &str = "/?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Placeholder {
        name: String,
        constraint: Option<String>,
    },
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(text) => f.write_str(text),
            Token::Placeholder {
                name,
                constraint: Some(constraint),
            } => write!(f, "{{<{constraint}>{name}}}"),
            Token::Placeholder {
                name,
                constraint: None,
            } => write!(f, "{{{name}}}"),
        }
    }
}

/// Split a template into literal text and placeholders, in template order.
pub(crate) fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(ch) = rest.chars().next() {
        if ch == '{' {
            if let Some((token, consumed)) = parse_placeholder(rest) {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(token);
                rest = &rest[consumed..];
                continue;
            }
        }
        literal.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Parse a placeholder at the start of `rest` (which begins with `{`).
/// Returns the token and the number of bytes it spans.
fn parse_placeholder(rest: &str) -> Option<(Token, usize)> {
    let body = &rest[1..];
    let (constraint, after) = match body.strip_prefix('<') {
        Some(inner) => {
            let end = inner.find('>')?;
            if end == 0 {
                return None;
            }
            (Some(&inner[..end]), &inner[end + 1..])
        }
        None => (None, body),
    };

    let name_len = after
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    if name_len == 0 || !after[name_len..].starts_with('}') {
        return None;
    }

    let consumed = rest.len() - after.len() + name_len + 1;
    let token = Token::Placeholder {
        name: after[..name_len].to_string(),
        constraint: constraint.map(str::to_string),
    };
    Some((token, consumed))
}

/// A named template variable with its constraint.
#[derive(Debug, Clone)]
pub struct Arg {
    name: String,
    constraint: Regex,
    constraint_source: String,
    /// Set only on the host argument; holds the raw host template.
    default_value: Option<String>,
    /// Reverse binds an empty value when the argument is missing.
    host_fallback: bool,
    optional: bool,
}

impl Arg {
    fn new(name: &str, constraint: &str) -> RoutingResult<Self> {
        Ok(Self {
            name: name.to_string(),
            constraint: build_regex(&format!("^(?:{constraint})$"), false)?,
            constraint_source: constraint.to_string(),
            default_value: None,
            host_fallback: false,
            optional: false,
        })
    }

    fn host(name: &str, host_template: &str) -> RoutingResult<Self> {
        let mut arg = Self::new(name, HOST_CONSTRAINT)?;
        arg.default_value = Some(host_template.to_string());
        Ok(arg)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constraint as written in the template.
    pub fn constraint(&self) -> &str {
        &self.constraint_source
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Reserved; never consulted by matching.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// True when reverse resolution may bind an empty value for this
    /// argument instead of rejecting the route, as for hosts written as a
    /// regex (`{(.*)}.example.com`).
    pub fn host_fallback(&self) -> bool {
        self.host_fallback
    }

    /// True for the argument bound from the host rather than the path.
    pub fn is_host_arg(&self) -> bool {
        self.default_value.is_some()
    }

    /// Full match of `value` against the constraint.
    pub fn accepts(&self, value: &str) -> bool {
        self.constraint.is_match(value)
    }
}

/// Host part of a route template, e.g. `{client}.example.com`.
///
/// Everything from the first `{` to the last `}` is one placeholder.
#[derive(Debug, Clone, Default)]
pub(crate) struct HostTemplate {
    raw: String,
    prefix: String,
    placeholder: Option<String>,
    suffix: String,
}

impl HostTemplate {
    fn parse(raw: &str) -> Self {
        let region = raw
            .find('{')
            .and_then(|start| raw.rfind('}').filter(|end| *end > start).map(|end| (start, end)));

        match region {
            Some((start, end)) => Self {
                raw: raw.to_string(),
                prefix: raw[..start].to_string(),
                placeholder: Some(raw[start + 1..end].replace(['{', '}'], "")),
                suffix: raw[end + 1..].to_string(),
            },
            None => Self {
                raw: raw.to_string(),
                prefix: raw.to_string(),
                placeholder: None,
                suffix: String::new(),
            },
        }
    }

    fn pattern(&self) -> Option<String> {
        if self.raw.is_empty() {
            return None;
        }
        let wildcard = if self.placeholder.is_some() { "(.*)" } else { "" };
        Some(format!(
            "{}{}{}",
            regex::escape(&self.prefix),
            wildcard,
            regex::escape(&self.suffix)
        ))
    }

    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    /// The template with braces removed, e.g. `client.example.com`.
    pub(crate) fn stripped(&self) -> String {
        self.raw.replace(['{', '}'], "")
    }

    fn render(&self, bound: &HashMap<&str, &str>) -> String {
        match &self.placeholder {
            Some(name) => match bound.get(name.as_str()) {
                Some(value) => format!("{}{}{}", self.prefix, encode_value(value), self.suffix),
                None => self.raw.clone(),
            },
            None => self.raw.clone(),
        }
    }
}

/// Compiled state of one route. Built once by [`compile`], never mutated.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    path: String,
    host: HostTemplate,
    args: Vec<Arg>,
    path_pattern: Regex,
    host_pattern: Option<Regex>,
    action_pattern: Regex,
    action_args: Vec<String>,
    /// Path tokens used for rendering, trailing `/?` removed.
    render_tokens: Vec<Token>,
}

/// Compile a route template (`[host]/path`) and its action template.
///
/// Malformed constraints surface as [`RoutingError::InvalidPattern`].
pub fn compile(template: &str, action: &str) -> RoutingResult<CompiledRoute> {
    let (host, path) = split_host(template)?;
    let host = HostTemplate::parse(host);

    let mut args = Vec::new();
    if let Some(name) = &host.placeholder {
        tracing::trace!(host = %host.raw, arg = %name, "adding host arg");
        args.push(Arg::host(name, &host.raw)?);
    }

    let tokens = tokenize(path);
    let mut pattern = String::from("^(?:");
    for token in &tokens {
        match token {
            Token::Literal(text) => pattern.push_str(text),
            Token::Placeholder { name, constraint } => {
                if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
                    return Err(RoutingError::RouteFileParsing(format!(
                        "argument `{name}` in `{template}` must start with a letter or '_'"
                    )));
                }
                if args.iter().any(|arg| arg.name == *name) {
                    return Err(RoutingError::RouteFileParsing(format!(
                        "argument `{name}` appears twice in `{template}`"
                    )));
                }
                let constraint = constraint.as_deref().unwrap_or(DEFAULT_PATH_CONSTRAINT);
                args.push(Arg::new(name, constraint)?);
                pattern.push_str(&format!("(?P<{name}>{constraint})"));
            }
        }
    }
    pattern.push_str(")$");

    let stripped_host = host.stripped();
    for arg in &mut args {
        arg.host_fallback = stripped_host == arg.name
            || Regex::new(&format!("^(?:{})$", arg.name)).is_ok_and(|re| re.is_match(&stripped_host));
    }

    let path_pattern = build_regex(&pattern, false)?;
    let host_pattern = host
        .pattern()
        .map(|p| build_regex(&format!("^(?:{p})$"), true))
        .transpose()?;
    let (action_pattern, action_args) = compile_action(action, &args)?;

    Ok(CompiledRoute {
        path: path.to_string(),
        host,
        args,
        path_pattern,
        host_pattern,
        action_pattern,
        action_args,
        render_tokens: strip_optional_slash(tokens),
    })
}

fn split_host(template: &str) -> RoutingResult<(&str, &str)> {
    if template.starts_with('/') {
        return Ok(("", template));
    }
    match template.find('/') {
        Some(index) => Ok(template.split_at(index)),
        None => Err(RoutingError::RouteFileParsing(format!(
            "path `{template}` must contain '/'"
        ))),
    }
}

fn compile_action(action: &str, args: &[Arg]) -> RoutingResult<(Regex, Vec<String>)> {
    let mut action_args: Vec<String> = Vec::new();
    let mut pattern = String::from("^(?:");

    for token in tokenize(action) {
        let arg = match &token {
            Token::Placeholder {
                name,
                constraint: None,
            } => args.iter().find(|arg| arg.name == *name),
            _ => None,
        };
        match arg {
            Some(arg) if !action_args.contains(&arg.name) => {
                pattern.push_str(&format!("(?P<{}>{})", arg.name, arg.constraint_source));
                action_args.push(arg.name.clone());
            }
            // a second occurrence cannot reuse the group name
            Some(arg) => pattern.push_str(&format!("(?:{})", arg.constraint_source)),
            None => pattern.push_str(&regex::escape(&token.to_string())),
        }
    }
    pattern.push_str(")$");

    Ok((build_regex(&pattern, true)?, action_args))
}

fn strip_optional_slash(mut tokens: Vec<Token>) -> Vec<Token> {
    if let Some(Token::Literal(text)) = tokens.last_mut() {
        if let Some(stripped) = text.strip_suffix(OPTIONAL_SLASH) {
            *text = stripped.to_string();
            if text.is_empty() {
                tokens.pop();
            }
        }
    }
    tokens
}

fn build_regex(pattern: &str, case_insensitive: bool) -> RoutingResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| RoutingError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Percent-encode a URL value. Deferred `:tokens` pass through untouched.
pub(crate) fn encode_value(value: &str) -> String {
    if is_deferred(value) {
        value.to_string()
    } else {
        byte_serialize(value.as_bytes()).collect()
    }
}

pub(crate) fn encode_key(key: &str) -> String {
    byte_serialize(key.as_bytes()).collect()
}

impl CompiledRoute {
    /// Path template without the host part.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw host template; empty for host-agnostic routes.
    pub fn host(&self) -> &str {
        self.host.raw()
    }

    /// Arguments in template order, host argument first.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn path_pattern(&self) -> &Regex {
        &self.path_pattern
    }

    pub fn host_pattern(&self) -> Option<&Regex> {
        self.host_pattern.as_ref()
    }

    pub fn action_pattern(&self) -> &Regex {
        &self.action_pattern
    }

    /// Arguments captured from the action string during reverse resolution.
    pub fn action_args(&self) -> &[String] {
        &self.action_args
    }

    pub(crate) fn host_template(&self) -> &HostTemplate {
        &self.host
    }

    /// The host placeholder's value: the request host minus the static
    /// portion of the host template.
    pub(crate) fn host_value(&self, host: &str) -> String {
        let static_part = format!("{}{}", self.host.prefix, self.host.suffix);
        host.replace(&static_part.to_ascii_lowercase(), "")
    }

    pub(crate) fn render_path(&self, bound: &HashMap<&str, &str>) -> String {
        self.render_tokens
            .iter()
            .map(|token| match token {
                Token::Literal(text) => text.clone(),
                Token::Placeholder { name, .. } => match bound.get(name.as_str()) {
                    Some(value) => encode_value(value),
                    None => token.to_string(),
                },
            })
            .collect()
    }

    pub(crate) fn render_host(&self, bound: &HashMap<&str, &str>) -> String {
        self.host.render(bound)
    }
}
