/// Factory: build the `PrincipalResolver` from application `Config`.
use std::sync::Arc;

use crate::config::{AccessKeyConfig, Config, ConfigError};
use crate::services::auth::access_jwt::AccessKey;
use crate::services::auth::{JwtVerifier, PrincipalResolver};

const PEM_VAR: &str = "ACCESS_JWT_PUBLIC_KEY_PEM";
const SECRET_VAR: &str = "ACCESS_JWT_HS256_SECRET";

pub fn build_principal_resolver(config: &Config) -> Result<Arc<PrincipalResolver>, ConfigError> {
    let (key, var) = match &config.access_key {
        AccessKeyConfig::Ed25519Pem(pem) => (AccessKey::Ed25519Pem(pem), PEM_VAR),
        AccessKeyConfig::Hs256Secret(secret) => {
            (AccessKey::Hs256Secret(secret.as_bytes()), SECRET_VAR)
        }
    };

    let verifier = JwtVerifier::new(
        key,
        config.auth_issuer.as_deref(),
        config.auth_audience.as_deref(),
        config.access_token_leeway_seconds,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "failed to build access token verifier");
        ConfigError::Invalid(var)
    })?;

    Ok(Arc::new(PrincipalResolver::new(
        Arc::new(verifier),
        config.token_verify_timeout,
    )))
}
