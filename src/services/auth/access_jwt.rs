use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::services::auth::{TokenVerifier, VerificationError, VerifiedToken};

fn aud_is_present_and_valid(aud: &serde_json::Value) -> bool {
    match aud {
        // Typical: aud is a string
        serde_json::Value::String(s) => !s.trim().is_empty(),
        // Also valid: aud is an array of strings
        serde_json::Value::Array(arr) => arr.iter().any(|v| match v {
            serde_json::Value::String(s) => !s.trim().is_empty(),
            _ => false,
        }),
        _ => false,
    }
}

/// Access token (JWT) claims.
///
/// NOTE:
/// - authorities come from `authorities`, `roles` and a single `role` claim, merged in that order.
/// - `aud` is only inspected when an audience is configured.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: serde_json::Value,

    #[serde(default)]
    pub authorities: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl AccessTokenClaims {
    fn into_verified(self) -> VerifiedToken {
        let mut authorities: Vec<String> = Vec::new();
        for authority in self
            .authorities
            .into_iter()
            .chain(self.roles)
            .chain(self.role)
        {
            let authority = authority.trim();
            if !authority.is_empty() && !authorities.iter().any(|a| a == authority) {
                authorities.push(authority.to_string());
            }
        }

        VerifiedToken {
            identity: self.sub,
            authorities,
        }
    }
}

/// Key material accepted for access-token signatures.
pub enum AccessKey<'a> {
    /// Ed25519 public key (PEM), EdDSA signatures.
    Ed25519Pem(&'a str),
    /// Shared HMAC secret, HS256 signatures.
    Hs256Secret(&'a [u8]),
}

/// JWT access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    expect_audience: bool,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(
        key: AccessKey<'_>,
        issuer: Option<&str>,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, VerificationError> {
        let (decoding_key, algorithm) = match key {
            AccessKey::Ed25519Pem(pem) => {
                (DecodingKey::from_ed_pem(pem.as_bytes())?, Algorithm::EdDSA)
            }
            AccessKey::Hs256Secret(secret) => (DecodingKey::from_secret(secret), Algorithm::HS256),
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = leeway_seconds;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
            expect_audience: audience.is_some(),
        })
    }

    // Verify and decode a JWT access token.
    pub fn decode(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks:
    /// - signature
    /// - `exp` (with leeway)
    /// - `iss` and `aud` when configured
    ///
    /// This method additionally rejects empty `sub`/`exp` and a blank `aud`.
    pub fn verify_strict(&self, token: &str) -> Result<AccessTokenClaims, VerificationError> {
        let claims = self.decode(token)?;

        if claims.sub.trim().is_empty() {
            return Err(VerificationError::EmptyClaim("sub"));
        }
        if claims.exp == 0 {
            return Err(VerificationError::EmptyClaim("exp"));
        }
        if self.expect_audience && !aud_is_present_and_valid(&claims.aud) {
            return Err(VerificationError::MissingOrInvalidAud);
        }

        Ok(claims)
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    fn name(&self) -> &'static str {
        "jwt"
    }

    async fn verify(&self, token: &str) -> Result<VerifiedToken, VerificationError> {
        self.verify_strict(token).map(AccessTokenClaims::into_verified)
    }
}
