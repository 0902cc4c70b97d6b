//! Principal resolution (bearer token → Principal).
//!
//! Runs once per request before authorization. It never rejects a request:
//! a missing, malformed, expired or unverifiable token resolves to `None` and
//! the decision engine stays the single place that allows or denies.
use std::{fmt, sync::Arc, time::Duration};

use axum::http::{HeaderMap, header};

use crate::services::auth::{Principal, TokenVerifier};

/// Extract `<token>` from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively; a blank token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub struct PrincipalResolver {
    verifier: Arc<dyn TokenVerifier>,
    timeout: Duration,
}

impl fmt::Debug for PrincipalResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrincipalResolver")
            .field("verifier", &self.verifier.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PrincipalResolver {
    pub fn new(verifier: Arc<dyn TokenVerifier>, timeout: Duration) -> Self {
        Self { verifier, timeout }
    }

    pub async fn resolve(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = bearer_token(headers)?;

        // Dropping this future (client disconnect) drops the in-flight verification.
        let verified = match tokio::time::timeout(self.timeout, self.verifier.verify(token)).await
        {
            Ok(Ok(verified)) => verified,
            Ok(Err(err)) => {
                tracing::warn!(
                    verifier = self.verifier.name(),
                    error = %err,
                    "access token verification failed"
                );
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    verifier = self.verifier.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "access token verification timed out"
                );
                return None;
            }
        };

        Some(Principal::new(verified.identity, verified.authorities))
    }
}
