//! Test doubles for `TokenVerifier`.
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;

use crate::services::auth::{TokenVerifier, VerificationError, VerifiedToken};

/// Accepts only the tokens registered with `with_token`.
#[derive(Debug, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, VerifiedToken>,
}

impl StaticVerifier {
    pub fn with_token(mut self, token: &str, identity: &str, authorities: &[&str]) -> Self {
        self.tokens.insert(
            token.to_string(),
            VerifiedToken {
                identity: identity.to_string(),
                authorities: authorities.iter().map(|a| a.to_string()).collect(),
            },
        );
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn verify(&self, token: &str) -> Result<VerifiedToken, VerificationError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| VerificationError::Rejected("unknown token".into()))
    }
}

/// Never answers before the given delay.
#[derive(Debug)]
pub struct SlowVerifier(pub Duration);

#[async_trait]
impl TokenVerifier for SlowVerifier {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn verify(&self, _token: &str) -> Result<VerifiedToken, VerificationError> {
        tokio::time::sleep(self.0).await;
        Err(VerificationError::Rejected("too late".into()))
    }
}
