/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: リクエストセキュリティフィルタ (Principal 解決 → 認可判定)
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
