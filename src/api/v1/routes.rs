/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認可は Router 全体に掛かるセキュリティフィルタが担当する (ここでは route_layer を使わない)
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::me::me;

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
