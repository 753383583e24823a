use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{AuthorizationDecision, AuthorizationGuard};

/// Admin gate for a router: runs the guard and injects the authorized
/// [`Principal`](crate::auth::Principal) into request extensions for handlers
/// to pick up with `Extension<Principal>`.
pub async fn require_admin(
    State(guard): State<AuthorizationGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard.authorize(request.headers()).await {
        AuthorizationDecision::Authorized(principal) => {
            tracing::debug!(principal = %principal.id, "Admin request authorized");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        AuthorizationDecision::Denied(denial) => denial.into_response(),
    }
}
