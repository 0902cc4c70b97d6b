/*
 * Responsibility
 * - Config読み込み → 依存生成 (PrincipalResolver / RuleSet) → Router 組み立て
 * - Middleware の適用 (セキュリティフィルタ / security headers / CORS / HTTP)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, v1::handlers::health::health};
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::auth::build_principal_resolver;
use crate::services::authz::{RuleSet, defaults, rules_file};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,shop_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        // Development: fail fast. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    // Any configuration error stops the process here, before the listener is bound.
    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    let resolver = build_principal_resolver(config)?;
    let rules = Arc::new(build_rules(config)?);

    tracing::info!(resolver = ?resolver, "principal resolver ready");

    Ok(AppState::new(resolver, rules))
}

fn build_rules(config: &Config) -> Result<RuleSet> {
    let (rules, source) = match &config.security_rules_path {
        Some(path) => {
            let rules = rules_file::load(path)
                .with_context(|| format!("loading security rules from {}", path.display()))?;
            (rules, path.display().to_string())
        }
        None => {
            let rules = defaults::storefront_rules().context("building built-in security rules")?;
            (rules, "built-in".to_string())
        }
    };

    tracing::info!(
        source = %source,
        rules = rules.len(),
        any_request = ?rules.any_request(),
        "security rules loaded"
    );

    if let Some(idx) = rules.shadowing_rule() {
        tracing::warn!(
            rule = idx,
            pattern = rules.rules()[idx].pattern().as_str(),
            unreachable = rules.len() - idx - 1,
            "public catch-all rule shadows every later rule"
        );
    }

    Ok(rules)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Routes + security filter. The filter wraps the fallback too, so unknown
/// paths are authorized before they 404.
fn secured_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .fallback(not_found);

    middleware::auth::access::apply(router, state.clone()).with_state(state)
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = secured_router(state);
    let router = middleware::security_headers::apply(router, config);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::{PrincipalResolver, testing::StaticVerifier};

    fn scenario_rules() -> RuleSet {
        RuleSet::builder()
            .request_matchers(["/auth/register", "/auth/login"])
            .permit_all()
            .request_matchers(["/admin/**"])
            .has_authority("ADMIN")
            .request_matchers(["/product/add-product"])
            .has_authority("SELLER")
            .request_matchers(["/cart/add"])
            .has_authority("USER")
            .any_request()
            .authenticated()
            .build()
            .unwrap()
    }

    fn router(rules: RuleSet) -> Router {
        let verifier = StaticVerifier::default()
            .with_token("user-token", "u-1", &["USER"])
            .with_token("seller-token", "s-1", &["SELLER"]);
        let resolver = PrincipalResolver::new(Arc::new(verifier), Duration::from_secs(1));

        secured_router(AppState::new(Arc::new(resolver), Arc::new(rules)))
    }

    async fn send(router: &Router, method: Method, path: &str, token: Option<&str>) -> Response {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        router
            .clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn public_rule_lets_anonymous_requests_through_to_routing() {
        let app = router(scenario_rules());

        // allowed by the filter, then no route: 404 rather than 401
        let res = send(&app, Method::POST, "/auth/login", None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(res).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn principal_without_authority_gets_403() {
        let app = router(scenario_rules());

        let res = send(&app, Method::GET, "/admin/x", Some("user-token")).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(res.headers().get(header::WWW_AUTHENTICATE).is_none());
        assert_eq!(json(res).await["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn anonymous_request_to_protected_path_gets_401() {
        let app = router(scenario_rules());

        for path in ["/other", "/admin/x", "/cart/add"] {
            let res = send(&app, Method::GET, path, None).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
            assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[tokio::test]
    async fn invalid_token_degrades_to_anonymous() {
        let app = router(scenario_rules());

        let res = send(&app, Method::GET, "/api/v1/me", Some("forged")).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = send(&app, Method::POST, "/auth/login", Some("forged")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn resolved_principal_reaches_handlers_unchanged() {
        let app = router(scenario_rules());

        let res = send(&app, Method::GET, "/api/v1/me", Some("seller-token")).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = json(res).await;
        assert_eq!(body["identity"], "s-1");
        assert_eq!(body["authorities"], serde_json::json!(["SELLER"]));
    }

    #[tokio::test]
    async fn authority_rule_satisfied_reaches_routing() {
        let app = router(scenario_rules());

        let res = send(&app, Method::POST, "/cart/add", Some("user-token")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = send(&app, Method::POST, "/product/add-product", Some("user-token")).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn built_in_rules_are_public_everywhere() {
        let app = router(defaults::storefront_rules().unwrap());

        let res = send(&app, Method::GET, "/health", None).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = send(&app, Method::POST, "/admin/anything", None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        // the filter allows it; the handler still needs a principal
        let res = send(&app, Method::GET, "/api/v1/me", None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = send(&app, Method::GET, "/api/v1/me", Some("user-token")).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
