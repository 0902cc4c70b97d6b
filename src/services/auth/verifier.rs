//! Token-verification collaborator used by the principal resolver.
use async_trait::async_trait;
use thiserror::Error;

/// Identity and authorities extracted from a token that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub identity: String,
    pub authorities: Vec<String>,
}

/// Verification failures. The resolver recovers every variant as "no principal".
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("missing or invalid 'aud' claim")]
    MissingOrInvalidAud,
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Validates a bearer token (signature, expiry, claims).
///
/// Implementations must be shareable across request tasks. A verifier that
/// does blocking work should keep it short; the resolver bounds every call
/// with a timeout and drops the future on cancellation.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    // Returns the verifier name (for logging).
    fn name(&self) -> &'static str;

    async fn verify(&self, token: &str) -> Result<VerifiedToken, VerificationError>;
}
