/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, CORS 許可、Auth 設定、認可ルールファイルなど)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

const PUBLIC_KEY_VAR: &str = "ACCESS_JWT_PUBLIC_KEY_PEM";
const HS256_SECRET_VAR: &str = "ACCESS_JWT_HS256_SECRET";

/// Access-token key material. Exactly one source must be configured.
#[derive(Clone, PartialEq, Eq)]
pub enum AccessKeyConfig {
    Ed25519Pem(String),
    Hs256Secret(String),
}

impl fmt::Debug for AccessKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        match self {
            Self::Ed25519Pem(_) => f.write_str("Ed25519Pem(..)"),
            Self::Hs256Secret(_) => f.write_str("Hs256Secret(..)"),
        }
    }
}

impl AccessKeyConfig {
    pub fn from_sources(
        public_key_pem: Option<String>,
        hs256_secret: Option<String>,
    ) -> Result<Self, ConfigError> {
        match (public_key_pem, hs256_secret) {
            (Some(pem), None) => Ok(Self::Ed25519Pem(pem.replace("\\n", "\n"))),
            (None, Some(secret)) => Ok(Self::Hs256Secret(secret)),
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "ACCESS_JWT_PUBLIC_KEY_PEM and ACCESS_JWT_HS256_SECRET are mutually exclusive",
            )),
            (None, None) => Err(ConfigError::Missing(
                "ACCESS_JWT_PUBLIC_KEY_PEM or ACCESS_JWT_HS256_SECRET",
            )),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub access_token_leeway_seconds: u64,
    pub access_key: AccessKeyConfig,
    pub token_verify_timeout: Duration,

    // None => built-in storefront rules
    pub security_rules_path: Option<PathBuf>,

    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_issuer = non_empty_var("AUTH_ISSUER");
        let auth_audience = non_empty_var("AUTH_AUDIENCE");

        let access_token_leeway_seconds = std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let access_key = AccessKeyConfig::from_sources(
            non_empty_var(PUBLIC_KEY_VAR),
            non_empty_var(HS256_SECRET_VAR),
        )?;

        let token_verify_timeout = match std::env::var("TOKEN_VERIFY_TIMEOUT_MS") {
            Ok(v) => v
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::Invalid("TOKEN_VERIFY_TIMEOUT_MS"))?,
            Err(_) => Duration::from_millis(2000),
        };

        let security_rules_path = non_empty_var("SECURITY_RULES_PATH").map(PathBuf::from);

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let body_limit_bytes = std::env::var("BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            access_key,
            token_verify_timeout,
            security_rules_path,
            request_timeout,
            body_limit_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_key_source_is_required() {
        assert_eq!(
            AccessKeyConfig::from_sources(None, Some("s3cret".into())).unwrap(),
            AccessKeyConfig::Hs256Secret("s3cret".into())
        );
        assert_eq!(
            AccessKeyConfig::from_sources(Some("-----BEGIN\\nKEY".into()), None).unwrap(),
            AccessKeyConfig::Ed25519Pem("-----BEGIN\nKEY".into())
        );
        assert!(matches!(
            AccessKeyConfig::from_sources(None, None),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            AccessKeyConfig::from_sources(Some("pem".into()), Some("secret".into())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn key_material_is_not_printed() {
        let key = AccessKeyConfig::Hs256Secret("s3cret".into());
        assert_eq!(format!("{key:?}"), "Hs256Secret(..)");
    }
}
