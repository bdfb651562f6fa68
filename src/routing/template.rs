//! URL template parsing and path matching.
//!
//! # Design Decisions
//! - Template syntax follows axum 0.8: `{name}` captures one segment,
//!   `{*name}` captures the remainder and must be last
//! - Literal segments are compared case-sensitively
//! - Leading and trailing slashes are ignored on both sides
//! - No regex: a match is a single linear walk over the segments
//! - Captures never contain `.` or `..` segments, raw or percent-encoded,
//!   so an expanded backend URI stays under its literal prefix

use std::collections::HashMap;
use std::fmt;

/// One parsed template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// Reasons a template string is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Empty,
    MissingLeadingSlash,
    EmptySegment,
    InvalidParam(String),
    DuplicateParam(String),
    CatchAllNotLast(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Empty => write!(f, "template is empty"),
            TemplateError::MissingLeadingSlash => write!(f, "template must start with '/'"),
            TemplateError::EmptySegment => write!(f, "template contains an empty segment"),
            TemplateError::InvalidParam(p) => write!(f, "invalid parameter segment '{}'", p),
            TemplateError::DuplicateParam(p) => write!(f, "parameter '{}' appears twice", p),
            TemplateError::CatchAllNotLast(p) => {
                write!(f, "catch-all parameter '{}' must be the last segment", p)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// A parsed URL template such as `/api/{version}/{*rest}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TemplateError::Empty);
        }
        if !trimmed.starts_with('/') {
            return Err(TemplateError::MissingLeadingSlash);
        }

        let mut segments = Vec::new();
        let mut seen = Vec::<String>::new();
        let parts = split_path(trimmed);
        let count = parts.len();

        for (i, part) in parts.into_iter().enumerate() {
            if part.is_empty() {
                return Err(TemplateError::EmptySegment);
            }
            let segment = if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                let (catch_all, name) = match inner.strip_prefix('*') {
                    Some(name) => (true, name),
                    None => (false, inner),
                };
                if !is_valid_param_name(name) {
                    return Err(TemplateError::InvalidParam(part.to_string()));
                }
                if seen.iter().any(|s| s == name) {
                    return Err(TemplateError::DuplicateParam(name.to_string()));
                }
                seen.push(name.to_string());
                if catch_all {
                    if i + 1 != count {
                        return Err(TemplateError::CatchAllNotLast(name.to_string()));
                    }
                    Segment::CatchAll(name.to_string())
                } else {
                    Segment::Param(name.to_string())
                }
            } else if part.contains('{') || part.contains('}') {
                return Err(TemplateError::InvalidParam(part.to_string()));
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// The template as written in the route file.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match a concrete request path.
    ///
    /// Returns the captured parameters on success.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts = split_path(path);
        let mut params = HashMap::new();
        let mut idx = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    if parts.get(idx) != Some(&lit.as_str()) {
                        return None;
                    }
                    idx += 1;
                }
                Segment::Param(name) => {
                    let value = parts
                        .get(idx)
                        .filter(|p| !p.is_empty() && !is_dot_segment(p))?;
                    params.insert(name.clone(), (*value).to_string());
                    idx += 1;
                }
                Segment::CatchAll(name) => {
                    let rest = parts.get(idx..).unwrap_or(&[]);
                    if rest.iter().any(|p| is_dot_segment(p)) {
                        return None;
                    }
                    let rest = rest.join("/");
                    params.insert(name.clone(), rest);
                    return Some(params);
                }
            }
        }

        if idx == parts.len() {
            Some(params)
        } else {
            None
        }
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn is_valid_param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let t = UrlTemplate::parse("/myproxy").unwrap();
        assert!(t.match_path("/myproxy").is_some());
        assert!(t.match_path("/myproxy/").is_some());
        assert!(t.match_path("/MyProxy").is_none());
        assert!(t.match_path("/myproxy/extra").is_none());
        assert!(t.match_path("/").is_none());
    }

    #[test]
    fn test_root_template() {
        let t = UrlTemplate::parse("/").unwrap();
        assert!(t.segments().is_empty());
        assert!(t.match_path("/").is_some());
        assert!(t.match_path("").is_some());
        assert!(t.match_path("/a").is_none());
    }

    #[test]
    fn test_param_capture() {
        let t = UrlTemplate::parse("/users/{id}/orders").unwrap();
        let params = t.match_path("/users/42/orders").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert!(t.match_path("/users/orders").is_none());
    }

    #[test]
    fn test_catch_all() {
        let t = UrlTemplate::parse("/api/{*rest}").unwrap();
        let params = t.match_path("/api/v1/items/7").unwrap();
        assert_eq!(params.get("rest").map(String::as_str), Some("v1/items/7"));

        let params = t.match_path("/api").unwrap();
        assert_eq!(params.get("rest").map(String::as_str), Some(""));
        assert!(t.match_path("/other/v1").is_none());
    }

    #[test]
    fn test_dot_segments_never_captured() {
        let t = UrlTemplate::parse("/api/{*rest}").unwrap();
        assert!(t.match_path("/api/../../admin/secret").is_none());
        assert!(t.match_path("/api/v1/./items").is_none());
        assert!(t.match_path("/api/%2e%2e/admin").is_none());
        assert!(t.match_path("/api/.%2E/admin").is_none());
        assert!(t.match_path("/api/v1/.well-known").is_some());

        let t = UrlTemplate::parse("/users/{id}/orders").unwrap();
        assert!(t.match_path("/users/../orders").is_none());
        assert!(t.match_path("/users/%2E/orders").is_none());
        assert!(t.match_path("/users/..7/orders").is_some());
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(UrlTemplate::parse(""), Err(TemplateError::Empty));
        assert_eq!(UrlTemplate::parse("  "), Err(TemplateError::Empty));
        assert_eq!(UrlTemplate::parse("api"), Err(TemplateError::MissingLeadingSlash));
        assert_eq!(UrlTemplate::parse("/a//b"), Err(TemplateError::EmptySegment));
        assert!(matches!(UrlTemplate::parse("/{}"), Err(TemplateError::InvalidParam(_))));
        assert!(matches!(UrlTemplate::parse("/a{b}"), Err(TemplateError::InvalidParam(_))));
        assert!(matches!(
            UrlTemplate::parse("/{id}/{id}"),
            Err(TemplateError::DuplicateParam(_))
        ));
        assert!(matches!(
            UrlTemplate::parse("/{*rest}/tail"),
            Err(TemplateError::CatchAllNotLast(_))
        ));
    }
}
