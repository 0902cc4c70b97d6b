//! JSON rule-set source.
//!
//! ```json
//! {
//!   "rules": [
//!     { "patterns": ["/auth/login", "/auth/register"], "access": "permit_all" },
//!     { "patterns": ["/admin/**"], "methods": ["GET"], "access": { "has_authority": "ADMIN" } }
//!   ],
//!   "any_request": "authenticated"
//! }
//! ```
//!
//! Each entry expands to one rule per pattern, in file order.
use std::path::{Path, PathBuf};

use axum::http::Method;
use serde::Deserialize;
use thiserror::Error;

use super::rule::{Requirement, RuleError, RuleSet};

#[derive(Debug, Error)]
pub enum RulesFileError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed rules file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rule entry #{index} has no patterns")]
    EmptyPatterns { index: usize },
    #[error("rule entry #{index} has an invalid method '{method}'")]
    InvalidMethod { index: usize, method: String },
    #[error(transparent)]
    Rule(#[from] RuleError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesDocument {
    rules: Vec<RuleEntry>,
    #[serde(default = "default_any_request")]
    any_request: Access,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    patterns: Vec<String>,
    #[serde(default)]
    methods: Option<Vec<String>>,
    access: Access,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Access {
    PermitAll,
    Authenticated,
    HasAuthority(String),
}

fn default_any_request() -> Access {
    Access::Authenticated
}

impl From<Access> for Requirement {
    fn from(access: Access) -> Self {
        match access {
            Access::PermitAll => Requirement::Public,
            Access::Authenticated => Requirement::Authenticated,
            Access::HasAuthority(name) => Requirement::HasAuthority(name),
        }
    }
}

fn parse_methods(index: usize, raw: Vec<String>) -> Result<Vec<Method>, RulesFileError> {
    raw.into_iter()
        .map(|m| {
            let upper = m.trim().to_ascii_uppercase();
            Method::from_bytes(upper.as_bytes())
                .ok()
                .filter(|_| !upper.is_empty())
                .ok_or(RulesFileError::InvalidMethod { index, method: m })
        })
        .collect()
}

pub fn from_json_str(json: &str) -> Result<RuleSet, RulesFileError> {
    let doc: RulesDocument = serde_json::from_str(json)?;

    let mut builder = RuleSet::builder();
    for (index, entry) in doc.rules.into_iter().enumerate() {
        if entry.patterns.is_empty() {
            return Err(RulesFileError::EmptyPatterns { index });
        }

        let methods = entry
            .methods
            .map(|raw| parse_methods(index, raw))
            .transpose()?;

        let mut group = builder.request_matchers(entry.patterns);
        if let Some(methods) = methods {
            group = group.methods(methods);
        }
        builder = group.access(entry.access.into());
    }

    Ok(builder.any_request().access(doc.any_request.into()).build()?)
}

pub fn load(path: &Path) -> Result<RuleSet, RulesFileError> {
    let json = std::fs::read_to_string(path).map_err(|source| RulesFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    from_json_str(&json)
}
