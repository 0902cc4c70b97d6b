//! Request path patterns used by authorization rules.
//!
//! Grammar (segment-wise, `/`-separated):
//! - `**`      zero or more remaining segments (last segment only)
//! - `*`       exactly one non-empty segment
//! - `{name}`  exactly one non-empty segment (path variable)
//! - `a*.png`  glob inside a single segment (`*` any run, `?` one char)
//! - anything else is a case-sensitive literal
//!
//! A pattern without a leading `/` gets one prepended.
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("'**' is only allowed as the last segment")]
    DeepWildcardNotLast,
    #[error("malformed path variable segment: {0}")]
    MalformedVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Single,
    Variable(String),
    Glob(Vec<char>),
    DeepWildcard,
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw == "**" {
            return Ok(Self::DeepWildcard);
        }
        if raw == "*" {
            return Ok(Self::Single);
        }
        if raw.starts_with('{') || raw.ends_with('}') {
            let name = raw
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .filter(|s| !s.is_empty() && !s.contains(['{', '}', '/']))
                .ok_or_else(|| PatternError::MalformedVariable(raw.to_string()))?;
            return Ok(Self::Variable(name.to_string()));
        }
        if raw.contains(['*', '?']) {
            return Ok(Self::Glob(raw.chars().collect()));
        }
        Ok(Self::Literal(raw.to_string()))
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Self::Literal(lit) => lit == segment,
            Self::Single | Self::Variable(_) => !segment.is_empty(),
            Self::Glob(glob) => glob_match(glob, segment),
            // handled by PathPattern::matches before reaching here
            Self::DeepWildcard => true,
        }
    }
}

/// Single-segment glob: `*` matches any run of characters, `?` exactly one.
fn glob_match(glob: &[char], input: &str) -> bool {
    let text: Vec<char> = input.chars().collect();
    let (mut g, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match glob.get(g).copied() {
            Some('*') => {
                star = Some((g, t));
                g += 1;
            }
            Some(c) if c == '?' || c == text[t] => {
                g += 1;
                t += 1;
            }
            _ => match star {
                Some((sg, st)) => {
                    g = sg + 1;
                    t = st + 1;
                    star = Some((sg, st + 1));
                }
                None => return false,
            },
        }
    }

    glob[g..].iter().all(|c| *c == '*')
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// A parsed, immutable path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(PatternError::Empty);
        }

        let raw = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };

        let segments = split_segments(&raw)
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let last = segments.len() - 1;
        if segments[..last].contains(&Segment::DeepWildcard) {
            return Err(PatternError::DeepWildcardNotLast);
        }

        Ok(Self { raw, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `/**`: matches every request path.
    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::DeepWildcard])
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = split_segments(path);

        for segment in &self.segments {
            if *segment == Segment::DeepWildcard {
                return true;
            }
            match parts.next() {
                Some(part) if segment.matches(part) => {}
                _ => return false,
            }
        }

        parts.next().is_none()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(p: &str) -> PathPattern {
        PathPattern::parse(p).expect("valid pattern")
    }

    #[test]
    fn literal_matches_exact_path_only() {
        let p = pattern("/auth/login");
        assert!(p.matches("/auth/login"));
        assert!(!p.matches("/auth/login/"));
        assert!(!p.matches("/auth"));
        assert!(!p.matches("/auth/Login"));
    }

    #[test]
    fn deep_wildcard_matches_zero_or_more_segments() {
        let p = pattern("/admin/**");
        assert!(p.matches("/admin"));
        assert!(p.matches("/admin/"));
        assert!(p.matches("/admin/x"));
        assert!(p.matches("/admin/x/y/z"));
        assert!(!p.matches("/administrator"));
        assert!(!p.matches("/other/admin"));
    }

    #[test]
    fn catch_all_matches_everything() {
        let p = pattern("/**");
        assert!(p.is_catch_all());
        assert!(p.matches("/"));
        assert!(p.matches("/anything/at/all"));
        assert!(!pattern("/admin/**").is_catch_all());
    }

    #[test]
    fn single_wildcard_and_variable_match_one_segment() {
        for raw in ["/users/*/posts", "/users/{id}/posts"] {
            let p = pattern(raw);
            assert!(p.matches("/users/42/posts"), "{raw}");
            assert!(!p.matches("/users//posts"), "{raw}");
            assert!(!p.matches("/users/1/2/posts"), "{raw}");
        }
    }

    #[test]
    fn glob_within_segment() {
        let p = pattern("/images/*.png");
        assert!(p.matches("/images/cat.png"));
        assert!(p.matches("/images/.png"));
        assert!(!p.matches("/images/cat.jpg"));

        let q = pattern("/v?/items");
        assert!(q.matches("/v1/items"));
        assert!(!q.matches("/v10/items"));
    }

    #[test]
    fn missing_leading_slash_is_normalized() {
        let p = pattern("v1/dev/shopping-cart/add-product-to-cart");
        assert_eq!(p.as_str(), "/v1/dev/shopping-cart/add-product-to-cart");
        assert!(p.matches("/v1/dev/shopping-cart/add-product-to-cart"));
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert_eq!(PathPattern::parse("  "), Err(PatternError::Empty));
        assert_eq!(
            PathPattern::parse("/a/**/b"),
            Err(PatternError::DeepWildcardNotLast)
        );
        assert!(matches!(
            PathPattern::parse("/users/{id"),
            Err(PatternError::MalformedVariable(_))
        ));
        assert!(matches!(
            PathPattern::parse("/users/{}"),
            Err(PatternError::MalformedVariable(_))
        ));
    }
}
