//! Authorization decisions.
//!
//! `RuleSet::decide` is a pure function of (rules, method, path, principal).
//! The rule set is immutable, so it is shared across request tasks without locks.
use std::fmt;

use axum::http::Method;

use super::rule::{Requirement, RuleSet};
use crate::services::auth::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    NoMatchingRuleButDefaultAuthRequired,
    RulePublic,
    RuleRequiresAuthAndAbsent,
    RuleRequiresAuthorityAndMissing,
    RuleSatisfied,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMatchingRuleButDefaultAuthRequired => {
                "NO_MATCHING_RULE_BUT_DEFAULT_AUTH_REQUIRED"
            }
            Self::RulePublic => "RULE_PUBLIC",
            Self::RuleRequiresAuthAndAbsent => "RULE_REQUIRES_AUTH_AND_ABSENT",
            Self::RuleRequiresAuthorityAndMissing => "RULE_REQUIRES_AUTHORITY_AND_MISSING",
            Self::RuleSatisfied => "RULE_SATISFIED",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub outcome: Outcome,
    pub reason: DecisionReason,
    /// Index of the rule that decided; `None` when the `any_request` fallback applied.
    pub matched_rule: Option<usize>,
}

impl Decision {
    fn allow(reason: DecisionReason, matched_rule: Option<usize>) -> Self {
        Self {
            outcome: Outcome::Allow,
            reason,
            matched_rule,
        }
    }

    fn deny(reason: DecisionReason, matched_rule: Option<usize>) -> Self {
        Self {
            outcome: Outcome::Deny,
            reason,
            matched_rule,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome == Outcome::Allow
    }

    fn evaluate(
        requirement: &Requirement,
        principal: Option<&Principal>,
        matched_rule: Option<usize>,
    ) -> Self {
        match (requirement, principal) {
            (Requirement::Public, _) => Self::allow(DecisionReason::RulePublic, matched_rule),
            (_, None) => Self::deny(DecisionReason::RuleRequiresAuthAndAbsent, matched_rule),
            (Requirement::Authenticated, Some(_)) => {
                Self::allow(DecisionReason::RuleSatisfied, matched_rule)
            }
            (Requirement::HasAuthority(name), Some(p)) if p.has_authority(name) => {
                Self::allow(DecisionReason::RuleSatisfied, matched_rule)
            }
            (Requirement::HasAuthority(_), Some(_)) => {
                Self::deny(DecisionReason::RuleRequiresAuthorityAndMissing, matched_rule)
            }
        }
    }
}

impl RuleSet {
    /// Decide a single request. First matching rule wins; otherwise `any_request` applies.
    pub fn decide(&self, method: &Method, path: &str, principal: Option<&Principal>) -> Decision {
        if let Some(idx) = self.rules().iter().position(|r| r.matches(method, path)) {
            return Decision::evaluate(self.rules()[idx].requirement(), principal, Some(idx));
        }

        match (self.any_request(), principal) {
            (Requirement::Public, _) => Decision::evaluate(&Requirement::Public, principal, None),
            (_, None) => Decision::deny(DecisionReason::NoMatchingRuleButDefaultAuthRequired, None),
            (requirement, Some(_)) => Decision::evaluate(requirement, principal, None),
        }
    }
}
