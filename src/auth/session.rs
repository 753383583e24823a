use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use sqlx::PgPool;
use uuid::Uuid;

use super::{decode_session_token, Principal};
use crate::database::user::{self, UserRow};
use crate::database::DatabaseError;

/// Why a session could not be resolved. The guard treats every variant as
/// "no session".
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Malformed session: {0}")]
    Malformed(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Identity provider seam: who is the current caller?
///
/// `Ok(None)` means the request carries no credential at all.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve_session(&self, headers: &HeaderMap) -> Result<Option<Principal>, IdentityError>;
}

/// Extract the session credential: `Authorization: Bearer` wins over the cookie.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Result<Option<String>, IdentityError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| IdentityError::Malformed("Invalid Authorization header format".to_string()))?;

        return match auth_str.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            Some(_) => Err(IdentityError::Malformed("Empty bearer token".to_string())),
            None => Err(IdentityError::Malformed(
                "Authorization header must use Bearer token format".to_string(),
            )),
        };
    }

    for value in headers.get_all(header::COOKIE) {
        let Ok(cookies) = value.to_str() else {
            continue;
        };
        for pair in cookies.split(';') {
            if let Some((name, token)) = pair.trim().split_once('=') {
                if name == cookie_name && !token.is_empty() {
                    return Ok(Some(token.to_string()));
                }
            }
        }
    }

    Ok(None)
}

/// Resolves the principal directly from verified token claims.
#[derive(Clone)]
pub struct TokenSessionResolver {
    secret: String,
    cookie_name: String,
}

impl TokenSessionResolver {
    pub fn new(secret: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: cookie_name.into(),
        }
    }
}

#[async_trait]
impl SessionResolver for TokenSessionResolver {
    async fn resolve_session(&self, headers: &HeaderMap) -> Result<Option<Principal>, IdentityError> {
        let Some(token) = extract_credential(headers, &self.cookie_name)? else {
            return Ok(None);
        };

        let claims = decode_session_token(&token, &self.secret)?;
        Principal::try_from(claims).map(Some)
    }
}

/// Verifies the token, then reloads the user row so role changes and
/// deletions take effect before the token expires.
#[derive(Clone)]
pub struct DatabaseSessionResolver {
    tokens: TokenSessionResolver,
    pool: PgPool,
}

impl DatabaseSessionResolver {
    pub fn new(tokens: TokenSessionResolver, pool: PgPool) -> Self {
        Self { tokens, pool }
    }
}

#[async_trait]
impl SessionResolver for DatabaseSessionResolver {
    async fn resolve_session(&self, headers: &HeaderMap) -> Result<Option<Principal>, IdentityError> {
        let Some(claimed) = self.tokens.resolve_session(headers).await? else {
            return Ok(None);
        };

        let row = user::find_active(&self.pool, claimed.id)
            .await
            .map_err(provider_unavailable)?;

        principal_from_row(claimed.id, row)
    }
}

/// A missing or soft-deleted user means the session is gone, not an error.
fn principal_from_row(claimed_id: Uuid, row: Option<UserRow>) -> Result<Option<Principal>, IdentityError> {
    match row {
        Some(row) => row.into_principal().map(Some),
        None => {
            tracing::debug!("Session user {} no longer active", claimed_id);
            Ok(None)
        }
    }
}

fn provider_unavailable(err: DatabaseError) -> IdentityError {
    IdentityError::Unavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_session_token, Role, SessionClaims};
    use axum::http::HeaderValue;

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        let h = headers(header::AUTHORIZATION, "Bearer abc.def.ghi");
        assert_eq!(extract_credential(&h, "hbm_session").unwrap().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_is_extracted_by_name() {
        let h = headers(header::COOKIE, "theme=dark; hbm_session=tok123; other=1");
        assert_eq!(extract_credential(&h, "hbm_session").unwrap().as_deref(), Some("tok123"));
        assert_eq!(extract_credential(&h, "missing").unwrap(), None);
    }

    #[test]
    fn non_bearer_authorization_is_malformed() {
        let h = headers(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        assert!(matches!(extract_credential(&h, "hbm_session"), Err(IdentityError::Malformed(_))));

        let h = headers(header::AUTHORIZATION, "Bearer   ");
        assert!(extract_credential(&h, "hbm_session").is_err());
    }

    #[test]
    fn no_credential_is_none() {
        assert_eq!(extract_credential(&HeaderMap::new(), "hbm_session").unwrap(), None);
    }

    #[tokio::test]
    async fn token_resolver_reads_cookie_session() {
        let principal = Principal {
            id: Uuid::new_v4(),
            email: "lecturer@hbm.com".to_string(),
            role: Role::Lecturer,
            name: None,
            avatar: Some("https://cdn.hbm.com/a.png".to_string()),
        };
        let token = issue_session_token(&SessionClaims::new(&principal, 1).unwrap(), "secret").unwrap();
        let resolver = TokenSessionResolver::new("secret", "hbm_session");

        let h = headers(header::COOKIE, &format!("hbm_session={token}"));
        let resolved = resolver.resolve_session(&h).await.unwrap();
        assert_eq!(resolved, Some(principal));
    }

    #[tokio::test]
    async fn token_resolver_rejects_garbage() {
        let resolver = TokenSessionResolver::new("secret", "hbm_session");
        let h = headers(header::AUTHORIZATION, "Bearer not-a-jwt");
        assert!(matches!(
            resolver.resolve_session(&h).await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    fn user_row(id: Uuid, role: &str) -> UserRow {
        UserRow {
            id,
            email: "lecturer@hbm.com".to_string(),
            role: role.to_string(),
            name: Some("Lin".to_string()),
            avatar: None,
            deleted_at: None,
        }
    }

    #[test]
    fn missing_user_row_means_no_session() {
        assert_eq!(principal_from_row(Uuid::new_v4(), None).unwrap(), None);
    }

    #[test]
    fn user_row_role_replaces_token_role() {
        let id = Uuid::new_v4();
        let principal = principal_from_row(id, Some(user_row(id, "lecturer"))).unwrap().unwrap();
        assert_eq!(principal.id, id);
        assert_eq!(principal.role, Role::Lecturer);
        assert_eq!(principal.name.as_deref(), Some("Lin"));
    }

    #[test]
    fn user_row_with_unknown_role_is_malformed() {
        let id = Uuid::new_v4();
        assert!(matches!(
            principal_from_row(id, Some(user_row(id, "superuser"))),
            Err(IdentityError::Malformed(_))
        ));
    }

    #[test]
    fn database_failure_reads_as_unavailable() {
        assert!(matches!(
            provider_unavailable(DatabaseError::NotConfigured),
            IdentityError::Unavailable(msg) if msg == "Database is not configured"
        ));
    }
}
