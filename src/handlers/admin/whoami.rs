// handlers/admin/whoami.rs - GET /api/admin/whoami

use axum::Extension;

use crate::auth::Principal;
use crate::middleware::ApiResponse;

/// Echo the authorized principal back to the caller.
pub async fn whoami(Extension(principal): Extension<Principal>) -> ApiResponse<Principal> {
    ApiResponse::success(principal)
}
