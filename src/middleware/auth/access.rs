//! リクエストセキュリティフィルタ: Bearer → Principal 解決 → 認可判定
//!
//! - 全リクエストに対して一度だけ実行される (routing の前、fallback も含む)
//! - Principal の解決に失敗してもここでは拒否しない。拒否は RuleSet の Decision だけが決める
//! - Allow: Principal を request extensions に入れて次へ
//! - Deny: 401 (Principal なし) / 403 (authority 不足)
//! - CSRF 対策は持たない (Cookie セッションを使わず Bearer のみで認証するため)

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Router 全体にセキュリティフィルタを掛ける。
///
/// 例：
/// ```ignore
/// let router = Router::new().route("/health", get(health)).nest("/api/v1", v1);
/// let router = middleware::auth::access::apply(router, state.clone()).with_state(state);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let principal = state.resolver.resolve(req.headers()).await;

    let decision = state
        .rules
        .decide(req.method(), req.uri().path(), principal.as_ref());

    if !decision.is_allowed() {
        tracing::info!(
            method = %req.method(),
            path = req.uri().path(),
            reason = %decision.reason,
            rule = ?decision.matched_rule,
            authenticated = principal.is_some(),
            "request denied"
        );
        return Err(AppError::denied(decision.reason));
    }

    tracing::debug!(
        method = %req.method(),
        path = req.uri().path(),
        reason = %decision.reason,
        rule = ?decision.matched_rule,
        principal = principal.as_ref().map(|p| p.identity()),
        "request allowed"
    );

    // middleware → extractor への受け渡し
    if let Some(principal) = principal {
        req.extensions_mut().insert(principal);
    }

    Ok(next.run(req).await)
}
