/*
 * Responsibility
 * - 認証済み主体 (Principal) の型
 * - filter が検証して request extensions に格納し、認可エンジンと handler はこの型だけを見る
 *
 * Notes
 * - request スコープの値。永続化しない
 */
use std::collections::BTreeSet;

/// Identity and granted authorities established from a verified bearer token.
///
/// `identity` is opaque to this crate (usually the token `sub`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    identity: String,
    authorities: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(identity: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity: identity.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn authorities(&self) -> &BTreeSet<String> {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}
