/*
 * Responsibility
 * - GET /me の response DTO
 */
use serde::Serialize;

use crate::services::auth::Principal;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub identity: String,
    pub authorities: Vec<String>,
}

impl From<Principal> for MeResponse {
    fn from(principal: Principal) -> Self {
        Self {
            identity: principal.identity().to_string(),
            authorities: principal.authorities().iter().cloned().collect(),
        }
    }
}
