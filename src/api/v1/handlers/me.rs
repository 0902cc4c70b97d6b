/*
 * Responsibility
 * - GET /me: フィルタが解決した Principal をそのまま返す
 */
use axum::Json;

use crate::api::v1::{dto::me::MeResponse, extractors::CurrentPrincipal};

pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<MeResponse> {
    Json(principal.into())
}
