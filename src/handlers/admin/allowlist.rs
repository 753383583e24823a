// handlers/admin/allowlist.rs - GET /api/admin/allowlist
//
// Read-only view of the perimeter configuration. The allowlist is loaded once
// at startup, so there is no write counterpart.

use axum::{extract::State, Extension};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::Principal;
use crate::config::SessionSource;
use crate::middleware::ApiResponse;

#[derive(Debug, Serialize)]
pub struct AllowlistSummary {
    pub entries: usize,
    pub session_source: SessionSource,
    pub requested_by: uuid::Uuid,
}

pub async fn allowlist_summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResponse<AllowlistSummary> {
    ApiResponse::success(AllowlistSummary {
        entries: state.config.security.admin_allowlist.len(),
        session_source: state.config.security.session_source,
        requested_by: principal.id,
    })
}
