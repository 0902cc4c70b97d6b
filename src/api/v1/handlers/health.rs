/*
 * Responsibility
 * - GET /health (疎通用)
 * - 認可ルール上の扱いは RuleSet 次第 (組み込みルールでは先頭付近の catch-all により PUBLIC)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
