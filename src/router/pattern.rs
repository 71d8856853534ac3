//! Compiled URI templates.
//!
//! A pattern is compiled in two passes: a parameter-extraction pass collects every
//! `{...}` placeholder, then the pattern is rewritten into an anchored regex where
//! literal text is escaped and each placeholder becomes a named capture group.

use super::core::{parse, split_query, ParsedUri};
use crate::error::{GatewayError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Maximum number of URI parameters before heap allocation.
/// Resource URIs rarely carry more than four placeholders.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Matched parameters in declaration order
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)(\?)?(?::([^{}]*))?\}")
        .expect("placeholder regex is valid")
});

/// A declared pattern parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternParam {
    pub name: Arc<str>,
    /// `{name?}` placeholders may be absent from the URI
    pub optional: bool,
    /// `{name:a|b}` placeholders only accept the listed literals
    pub allowed_values: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    /// Index into `params`; `segment` is true when the placeholder owns a whole
    /// path segment and its leading `/` is emitted with it
    Param { index: usize, segment: bool },
}

/// A compiled URI template
///
/// Compiled once per registered pattern; matching never mutates it, so one instance
/// is shared by every concurrent request.
#[derive(Debug, Clone)]
pub struct UriPattern {
    pub scheme: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub sub_resource_type: Option<String>,
    pub sub_resource_id: Option<String>,
    raw: Arc<str>,
    params: Vec<PatternParam>,
    pieces: Vec<Piece>,
    regex: Regex,
}

/// Result of matching a URI against a [`UriPattern`]
#[derive(Debug, Clone)]
pub struct UriMatch {
    /// The raw pattern that matched
    pub pattern: Arc<str>,
    /// One entry per declared parameter; absent optional parameters hold `""`
    pub parameters: ParamVec,
    pub parsed: ParsedUri,
}

impl UriMatch {
    /// Get a matched parameter, `None` when absent or empty
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Convert parameters to a map
    /// Note: This allocates - use get_param() on the request path instead
    #[must_use]
    pub fn parameters_map(&self) -> HashMap<String, String> {
        self.parameters
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl UriPattern {
    /// Compile a URI template
    ///
    /// # Errors
    ///
    /// Returns a validation error when the pattern has no scheme, carries unbalanced
    /// braces, declares a parameter twice, or declares an empty enumeration.
    pub fn compile(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        let path = strip_pattern_query(pattern);
        // `{name?}` and `{name:a|b}` collapse to `{name}` so the skeleton parses as a URI
        let parsed = parse(&PLACEHOLDER_RE.replace_all(path, "{$1}"))?;

        let mut params: Vec<PatternParam> = Vec::with_capacity(path.matches('{').count());
        let mut pieces: Vec<Piece> = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = 0;

        for caps in PLACEHOLDER_RE.captures_iter(path) {
            let Some(whole) = caps.get(0) else { continue };
            let name = caps.get(1).map_or("", |m| m.as_str());
            let optional = caps.get(2).is_some();
            let allowed_values = match caps.get(3) {
                Some(values) => {
                    let values: Vec<String> = values
                        .as_str()
                        .split('|')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .collect();
                    if values.is_empty() {
                        return Err(GatewayError::invalid_field(
                            "pattern",
                            format!("parameter '{name}' in '{pattern}' has an empty value set"),
                            "format",
                        ));
                    }
                    Some(values)
                }
                None => None,
            };

            if !seen.insert(name.to_string()) {
                return Err(GatewayError::invalid_field(
                    "pattern",
                    format!("parameter '{name}' declared twice in '{pattern}'"),
                    "duplicate",
                ));
            }

            let mut literal = &path[cursor..whole.start()];
            let rest = &path[whole.end()..];
            let segment =
                optional && literal.ends_with('/') && (rest.is_empty() || rest.starts_with('/'));
            if segment {
                literal = &literal[..literal.len() - 1];
            }
            push_literal(&mut pieces, literal, pattern)?;

            pieces.push(Piece::Param {
                index: params.len(),
                segment,
            });
            params.push(PatternParam {
                name: Arc::from(name),
                optional,
                allowed_values,
            });
            cursor = whole.end();
        }
        push_literal(&mut pieces, &path[cursor..], pattern)?;

        let mut source = String::with_capacity(path.len() * 2);
        source.push('^');
        for piece in &pieces {
            match piece {
                Piece::Literal(text) => source.push_str(&regex::escape(text)),
                Piece::Param { index, segment } => {
                    let param = &params[*index];
                    let body = match &param.allowed_values {
                        Some(values) => values
                            .iter()
                            .map(|v| regex::escape(v))
                            .collect::<Vec<_>>()
                            .join("|"),
                        None => "[^/]+".to_string(),
                    };
                    let group = format!("(?P<{}>{})", param.name, body);
                    if *segment {
                        source.push_str(&format!("(?:/{group})?"));
                    } else if param.optional {
                        source.push_str(&format!("{group}?"));
                    } else {
                        source.push_str(&group);
                    }
                }
            }
        }
        source.push_str("/?$");

        let regex = Regex::new(&source).map_err(|e| {
            GatewayError::invalid_field(
                "pattern",
                format!("pattern '{pattern}' does not compile: {e}"),
                "format",
            )
        })?;

        debug!(
            pattern = %pattern,
            regex = %source,
            params = params.len(),
            "Compiled URI pattern"
        );

        Ok(Self {
            scheme: parsed.scheme,
            resource_type: parsed.resource_type,
            resource_id: parsed.resource_id,
            sub_resource_type: parsed.sub_resource_type,
            sub_resource_id: parsed.sub_resource_id,
            raw: Arc::from(pattern),
            params,
            pieces,
            regex,
        })
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True when the resource type segment is a placeholder, e.g. `maas://{kind}`
    #[must_use]
    pub fn has_templated_type(&self) -> bool {
        self.resource_type.starts_with('{')
    }

    #[must_use]
    pub fn params(&self) -> &[PatternParam] {
        &self.params
    }

    /// The anchored regex source the pattern compiled to
    #[must_use]
    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    /// Cheap capability check; does not parse the URI
    #[must_use]
    pub fn is_match(&self, uri: &str) -> bool {
        let (path, _) = split_query(uri.trim());
        self.regex.is_match(path)
    }

    /// Match a URI and extract its parameters
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the URI does not satisfy the pattern, and a
    /// validation error when the URI itself is malformed.
    pub fn match_uri(&self, uri: &str) -> Result<UriMatch> {
        let uri = uri.trim();
        let (path, _) = split_query(uri);
        let caps = self.regex.captures(path).ok_or_else(|| {
            GatewayError::not_found(format!(
                "URI '{uri}' does not match pattern '{}'",
                self.raw
            ))
        })?;

        let parameters: ParamVec = self
            .params
            .iter()
            .map(|param| {
                let value = caps
                    .name(&param.name)
                    .map(|m| decode(m.as_str()))
                    .unwrap_or_default();
                (Arc::clone(&param.name), value)
            })
            .collect();

        Ok(UriMatch {
            pattern: Arc::clone(&self.raw),
            parameters,
            parsed: parse(uri)?,
        })
    }

    /// Substitute parameter values back into the pattern
    ///
    /// Optional parameters that are missing or empty drop out together with their
    /// leading `/`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a required parameter is missing or an
    /// enumerated parameter is given a value outside its set.
    pub fn expand<'a, I>(&self, values: I) -> Result<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let values: HashMap<&str, &str> = values.into_iter().collect();
        let mut out = String::with_capacity(self.raw.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Param { index, segment } => {
                    let param = &self.params[*index];
                    let value = values.get(param.name.as_ref()).copied().unwrap_or("");
                    if value.is_empty() {
                        if param.optional {
                            continue;
                        }
                        return Err(GatewayError::invalid_field(
                            param.name.as_ref(),
                            format!("required parameter missing for pattern '{}'", self.raw),
                            "required",
                        ));
                    }
                    if let Some(allowed) = &param.allowed_values {
                        if !allowed.iter().any(|a| a == value) {
                            return Err(GatewayError::invalid_field(
                                param.name.as_ref(),
                                format!("'{value}' is not one of {}", allowed.join("|")),
                                "enum",
                            ));
                        }
                    }
                    if *segment {
                        out.push('/');
                    }
                    out.push_str(&urlencoding::encode(value));
                }
            }
        }
        Ok(out)
    }
}

/// Drop a trailing query string; a `?` inside `{...}` marks an optional parameter
fn strip_pattern_query(pattern: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in pattern.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '?' if depth == 0 => return &pattern[..i],
            _ => {}
        }
    }
    pattern
}

fn push_literal(pieces: &mut Vec<Piece>, literal: &str, pattern: &str) -> Result<()> {
    if literal.contains('{') || literal.contains('}') {
        return Err(GatewayError::invalid_field(
            "pattern",
            format!("malformed placeholder in pattern '{pattern}'"),
            "format",
        ));
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal.to_string()));
    }
    Ok(())
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Compile `pattern` and match `uri` against it
///
/// # Errors
///
/// See [`UriPattern::compile`] and [`UriPattern::match_uri`].
pub fn match_uri(uri: &str, pattern: &str) -> Result<UriMatch> {
    UriPattern::compile(pattern)?.match_uri(uri)
}

/// Match discarding the output; used by capability probing
///
/// # Errors
///
/// See [`match_uri`].
pub fn validate(uri: &str, pattern: &str) -> Result<()> {
    match_uri(uri, pattern).map(|_| ())
}
