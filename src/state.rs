/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - resolver: PrincipalResolver, rules: RuleSet
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - 起動時に一度だけ構築し、以降は読み取り専用
 */
use std::sync::Arc;

use crate::services::{auth::PrincipalResolver, authz::RuleSet};

#[derive(Clone, Debug)]
pub struct AppState {
    pub resolver: Arc<PrincipalResolver>,
    pub rules: Arc<RuleSet>,
}

impl AppState {
    pub fn new(resolver: Arc<PrincipalResolver>, rules: Arc<RuleSet>) -> Self {
        Self { resolver, rules }
    }
}
