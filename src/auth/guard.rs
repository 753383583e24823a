//! Layered admin authorization.
//!
//! Every administrative entry point goes through [`AuthorizationGuard`], which
//! runs three ordered, short-circuiting checks:
//!
//! 1. session: the request resolves to a principal (401 otherwise)
//! 2. allowlist: the principal's email is on the operator allowlist (403)
//! 3. role: the principal's role is exactly `admin` (403)
//!
//! Routes that also let a resource owner through use
//! [`AuthorizationGuard::authorize_owner_or_admin`]. Ownership stands in for
//! the role check only; the session and allowlist checks still apply.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::allowlist::EmailAllowlist;
use super::audit::{AuditContext, AuditSink};
use super::session::SessionResolver;
use super::{Principal, Role};
use crate::error::ApiError;

/// Terminal denial returned to the HTTP caller verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No session, an invalid one, or the identity provider failed.
    NoSession,
    NotAllowlisted,
    WrongRole,
}

impl Denial {
    pub fn status(&self) -> StatusCode {
        match self {
            Denial::NoSession => StatusCode::UNAUTHORIZED,
            Denial::NotAllowlisted | Denial::WrongRole => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Denial::NoSession => "Unauthorized: No active session",
            Denial::NotAllowlisted => "Forbidden: Email not in admin allowlist",
            Denial::WrongRole => "Forbidden: User does not have admin role",
        }
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NoSession => ApiError::unauthorized(denial.message()),
            Denial::NotAllowlisted | Denial::WrongRole => ApiError::forbidden(denial.message()),
        }
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Outcome of one guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Authorized(Principal),
    Denied(Denial),
}

impl AuthorizationDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationDecision::Authorized(_))
    }

    pub fn into_result(self) -> Result<Principal, Denial> {
        match self {
            AuthorizationDecision::Authorized(principal) => Ok(principal),
            AuthorizationDecision::Denied(denial) => Err(denial),
        }
    }
}

/// A resource with an owning principal, e.g. a course and its editor.
pub trait OwnedResource {
    fn owner_id(&self) -> Option<Uuid>;
}

pub fn owns_resource<R: OwnedResource + ?Sized>(principal: &Principal, resource: &R) -> bool {
    resource.owner_id() == Some(principal.id)
}

/// Stateless guard; clones share the same collaborators.
#[derive(Clone)]
pub struct AuthorizationGuard {
    sessions: Arc<dyn SessionResolver>,
    allowlist: Arc<dyn EmailAllowlist>,
    audit: Arc<dyn AuditSink>,
}

impl AuthorizationGuard {
    pub fn new(
        sessions: Arc<dyn SessionResolver>,
        allowlist: Arc<dyn EmailAllowlist>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            sessions,
            allowlist,
            audit,
        }
    }

    pub async fn authorize(&self, headers: &HeaderMap) -> AuthorizationDecision {
        let principal = match self.allowlisted_principal(headers).await {
            Ok(principal) => principal,
            Err(denial) => return AuthorizationDecision::Denied(denial),
        };

        if principal.role != Role::Admin {
            self.audit_wrong_role(&principal);
            return AuthorizationDecision::Denied(Denial::WrongRole);
        }

        AuthorizationDecision::Authorized(principal)
    }

    /// Like [`authorize`](Self::authorize), but a non-admin that owns the
    /// resource is let through. `load` only runs once the session and
    /// allowlist checks have passed and the role check has failed; a missing
    /// resource is denied the same way as a non-owned one.
    pub async fn authorize_owner_or_admin<R, F, Fut, E>(
        &self,
        headers: &HeaderMap,
        load: F,
    ) -> Result<AuthorizationDecision, E>
    where
        R: OwnedResource,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<R>, E>>,
    {
        let principal = match self.allowlisted_principal(headers).await {
            Ok(principal) => principal,
            Err(denial) => return Ok(AuthorizationDecision::Denied(denial)),
        };

        if principal.role == Role::Admin {
            return Ok(AuthorizationDecision::Authorized(principal));
        }

        match load().await? {
            Some(resource) if owns_resource(&principal, &resource) => {
                tracing::debug!(principal = %principal.id, "Non-admin passed as resource owner");
                Ok(AuthorizationDecision::Authorized(principal))
            }
            _ => {
                self.audit_wrong_role(&principal);
                Ok(AuthorizationDecision::Denied(Denial::WrongRole))
            }
        }
    }

    /// Session then allowlist.
    async fn allowlisted_principal(&self, headers: &HeaderMap) -> Result<Principal, Denial> {
        let principal = match self.sessions.resolve_session(headers).await {
            Ok(Some(principal)) => principal,
            Ok(None) => return Err(Denial::NoSession),
            Err(e) => {
                // Anonymous traffic is not audited; keep this at debug.
                tracing::debug!(error = %e, "Session resolution failed");
                return Err(Denial::NoSession);
            }
        };

        if !self.allowlist.permits(&principal.email) {
            self.audit.warn(
                &format!("Admin access denied: email '{}' not in admin allowlist", principal.email),
                &AuditContext {
                    email: principal.email.clone(),
                    role: Some(principal.role),
                },
            );
            return Err(Denial::NotAllowlisted);
        }

        Ok(principal)
    }

    fn audit_wrong_role(&self, principal: &Principal) {
        self.audit.warn(
            &format!(
                "Admin access denied: role '{}' for '{}' is not admin",
                principal.role, principal.email
            ),
            &AuditContext {
                email: principal.email.clone(),
                role: Some(principal.role),
            },
        );
    }
}
