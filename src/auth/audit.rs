use crate::auth::Role;

/// Structured fields attached to an audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub email: String,
    pub role: Option<Role>,
}

/// Receives audit-relevant denials. Implementations must not block the caller.
pub trait AuditSink: Send + Sync {
    fn warn(&self, message: &str, context: &AuditContext);
}

/// Writes audit entries as `tracing` warnings on the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn warn(&self, message: &str, context: &AuditContext) {
        match context.role {
            Some(role) => tracing::warn!(
                target: "audit",
                email = %context.email,
                role = %role,
                "{}",
                message
            ),
            None => tracing::warn!(target: "audit", email = %context.email, "{}", message),
        }
    }
}
