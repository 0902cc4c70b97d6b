//! Authorization rules and the ordered, immutable rule set.
//!
//! The builder reads like a request-matcher chain:
//!
//! ```ignore
//! let rules = RuleSet::builder()
//!     .request_matchers(["/auth/login", "/auth/register"])
//!     .permit_all()
//!     .request_matchers(["/admin/**"])
//!     .has_authority("ADMIN")
//!     .any_request()
//!     .authenticated()
//!     .build()?;
//! ```
//!
//! `build()` validates every rule and freezes declaration order. Nothing is
//! reordered, merged or deduplicated: the first matching rule wins.
use axum::http::Method;
use thiserror::Error;

use super::pattern::{PathPattern, PatternError};

/// Pattern label used in errors raised for the `any_request` fallback.
const ANY_REQUEST: &str = "<any request>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    HasAuthority(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },
    #[error("empty authority name for '{pattern}'")]
    EmptyAuthority { pattern: String },
    #[error("empty method set for '{pattern}' (omit methods to match all)")]
    EmptyMethods { pattern: String },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pattern: PathPattern,
    methods: Option<Vec<Method>>,
    requirement: Requirement,
}

impl Rule {
    pub fn new(
        pattern: &str,
        methods: Option<Vec<Method>>,
        requirement: Requirement,
    ) -> Result<Self, RuleError> {
        let parsed = PathPattern::parse(pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        if methods.as_ref().is_some_and(|m| m.is_empty()) {
            return Err(RuleError::EmptyMethods {
                pattern: parsed.to_string(),
            });
        }
        validate_requirement(&requirement, parsed.as_str())?;

        Ok(Self {
            pattern: parsed,
            methods,
            requirement,
        })
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn methods(&self) -> Option<&[Method]> {
        self.methods.as_deref()
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        let method_ok = self
            .methods
            .as_ref()
            .is_none_or(|methods| methods.contains(method));

        method_ok && self.pattern.matches(path)
    }
}

fn validate_requirement(requirement: &Requirement, pattern: &str) -> Result<(), RuleError> {
    match requirement {
        Requirement::HasAuthority(name) if name.trim().is_empty() => {
            Err(RuleError::EmptyAuthority {
                pattern: pattern.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Ordered rules plus the fallback requirement for requests no rule matches.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    any_request: Requirement,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn any_request(&self) -> &Requirement {
        &self.any_request
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Index of the first method-agnostic `/**` PUBLIC rule that has rules after it.
    /// Every later rule is unreachable.
    pub fn shadowing_rule(&self) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| {
                rule.requirement == Requirement::Public
                    && rule.methods.is_none()
                    && rule.pattern.is_catch_all()
            })
            .filter(|idx| idx + 1 < self.rules.len())
    }
}

/// Mutable staging area; nothing is validated until `build()`.
#[derive(Debug)]
pub struct RuleSetBuilder {
    pending: Vec<(String, Option<Vec<Method>>, Requirement)>,
    any_request: Requirement,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            any_request: Requirement::Authenticated,
        }
    }
}

impl RuleSetBuilder {
    /// Append a single rule.
    pub fn rule(
        mut self,
        pattern: impl Into<String>,
        methods: Option<Vec<Method>>,
        requirement: Requirement,
    ) -> Self {
        self.pending.push((pattern.into(), methods, requirement));
        self
    }

    /// Start a group of patterns sharing one requirement.
    pub fn request_matchers<I, S>(self, patterns: I) -> MatcherGroup
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MatcherGroup {
            builder: self,
            patterns: patterns.into_iter().map(Into::into).collect(),
            methods: None,
        }
    }

    /// Configure the requirement applied when no rule matches.
    pub fn any_request(self) -> AnyRequest {
        AnyRequest { builder: self }
    }

    pub fn build(self) -> Result<RuleSet, RuleError> {
        validate_requirement(&self.any_request, ANY_REQUEST)?;

        let rules = self
            .pending
            .into_iter()
            .map(|(pattern, methods, requirement)| Rule::new(&pattern, methods, requirement))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RuleSet {
            rules,
            any_request: self.any_request,
        })
    }
}

pub struct MatcherGroup {
    builder: RuleSetBuilder,
    patterns: Vec<String>,
    methods: Option<Vec<Method>>,
}

impl MatcherGroup {
    /// Restrict the group to the given methods (an empty set fails at `build()`).
    pub fn methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    pub fn permit_all(self) -> RuleSetBuilder {
        self.finish(Requirement::Public)
    }

    pub fn authenticated(self) -> RuleSetBuilder {
        self.finish(Requirement::Authenticated)
    }

    pub fn has_authority(self, authority: impl Into<String>) -> RuleSetBuilder {
        self.finish(Requirement::HasAuthority(authority.into()))
    }

    pub fn access(self, requirement: Requirement) -> RuleSetBuilder {
        self.finish(requirement)
    }

    fn finish(self, requirement: Requirement) -> RuleSetBuilder {
        let MatcherGroup {
            mut builder,
            patterns,
            methods,
        } = self;

        for pattern in patterns {
            builder = builder.rule(pattern, methods.clone(), requirement.clone());
        }
        builder
    }
}

pub struct AnyRequest {
    builder: RuleSetBuilder,
}

impl AnyRequest {
    pub fn permit_all(self) -> RuleSetBuilder {
        self.access(Requirement::Public)
    }

    pub fn authenticated(self) -> RuleSetBuilder {
        self.access(Requirement::Authenticated)
    }

    pub fn has_authority(self, authority: impl Into<String>) -> RuleSetBuilder {
        self.access(Requirement::HasAuthority(authority.into()))
    }

    pub fn access(self, requirement: Requirement) -> RuleSetBuilder {
        let mut builder = self.builder;
        builder.any_request = requirement;
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_expand_in_declaration_order() {
        let rules = RuleSet::builder()
            .request_matchers(["/b", "/a"])
            .permit_all()
            .request_matchers(["/a"])
            .has_authority("ADMIN")
            .build()
            .unwrap();

        let patterns: Vec<_> = rules.rules().iter().map(|r| r.pattern().as_str()).collect();
        assert_eq!(patterns, ["/b", "/a", "/a"]);
        assert_eq!(rules.rules()[2].requirement(), &Requirement::HasAuthority("ADMIN".into()));
        assert_eq!(rules.any_request(), &Requirement::Authenticated);
    }

    #[test]
    fn empty_authority_is_rejected() {
        let err = RuleSet::builder()
            .request_matchers(["/admin/**"])
            .has_authority("  ")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::EmptyAuthority {
                pattern: "/admin/**".into()
            }
        );

        let err = RuleSet::builder()
            .any_request()
            .has_authority("")
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleError::EmptyAuthority { .. }));
    }

    #[test]
    fn empty_method_set_is_rejected() {
        let err = RuleSet::builder()
            .request_matchers(["/cart/add"])
            .methods(Vec::<Method>::new())
            .authenticated()
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleError::EmptyMethods { .. }));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = RuleSet::builder()
            .request_matchers(["/a/**/b"])
            .permit_all()
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn method_restriction() {
        let rule = Rule::new("/product/**", Some(vec![Method::POST]), Requirement::Authenticated)
            .unwrap();
        assert!(rule.matches(&Method::POST, "/product/1"));
        assert!(!rule.matches(&Method::GET, "/product/1"));
        assert!(!rule.matches(&Method::POST, "/cart"));

        let any = Rule::new("/product/**", None, Requirement::Public).unwrap();
        assert!(any.matches(&Method::DELETE, "/product"));
    }

    #[test]
    fn detects_catch_all_shadowing() {
        let shadowed = RuleSet::builder()
            .request_matchers(["/swagger-ui/**", "/**"])
            .permit_all()
            .request_matchers(["/admin/**"])
            .has_authority("ADMIN")
            .build()
            .unwrap();
        assert_eq!(shadowed.shadowing_rule(), Some(1));

        let last = RuleSet::builder()
            .request_matchers(["/admin/**"])
            .has_authority("ADMIN")
            .request_matchers(["/**"])
            .permit_all()
            .build()
            .unwrap();
        assert_eq!(last.shadowing_rule(), None);
    }
}
