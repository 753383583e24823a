pub mod allowlist;
pub mod audit;
pub mod guard;
pub mod session;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use allowlist::{AdminAllowlist, EmailAllowlist};
pub use audit::{AuditContext, AuditSink, TracingAuditSink};
pub use guard::{owns_resource, AuthorizationDecision, AuthorizationGuard, Denial, OwnedResource};
pub use session::{DatabaseSessionResolver, IdentityError, SessionResolver, TokenSessionResolver};

/// Platform roles. There is no hierarchy: only `Admin` is administrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lecturer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact match only; "Admin" or "administrator" are not roles.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "lecturer" => Ok(Role::Lecturer),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated caller for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Signed session token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Fails if `expiry_hours` is zero or pushes `exp` past what chrono can
    /// represent.
    pub fn new(principal: &Principal, expiry_hours: u64) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = session_expiry(now, expiry_hours)?.timestamp();

        Ok(Self {
            sub: principal.id,
            email: principal.email.clone(),
            role: principal.role.as_str().to_string(),
            name: principal.name.clone(),
            avatar: principal.avatar.clone(),
            exp,
            iat: now.timestamp(),
        })
    }
}

/// `now + expiry_hours`, checked. Used by token signing and config validation.
pub fn session_expiry(now: DateTime<Utc>, expiry_hours: u64) -> Result<DateTime<Utc>, TokenError> {
    if expiry_hours == 0 {
        return Err(TokenError::InvalidLifetime(expiry_hours));
    }

    i64::try_from(expiry_hours)
        .ok()
        .and_then(Duration::try_hours)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or(TokenError::InvalidLifetime(expiry_hours))
}

impl TryFrom<SessionClaims> for Principal {
    type Error = IdentityError;

    fn try_from(claims: SessionClaims) -> Result<Self, Self::Error> {
        if claims.email.trim().is_empty() {
            return Err(IdentityError::Malformed("session carries no email".to_string()));
        }
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|e| IdentityError::Malformed(e.to_string()))?;

        Ok(Principal {
            id: claims.sub,
            email: claims.email,
            role,
            name: claims.name,
            avatar: claims.avatar,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid session lifetime: {0} hours")]
    InvalidLifetime(u64),

    #[error("JWT generation error: {0}")]
    Generation(#[from] jsonwebtoken::errors::Error),
}

/// Sign a session token for `claims` with HS256.
pub fn issue_session_token(claims: &SessionClaims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), claims, &encoding_key)?)
}

/// Verify signature and expiry, returning the raw claims.
pub fn decode_session_token(token: &str, secret: &str) -> Result<SessionClaims, IdentityError> {
    if secret.is_empty() {
        return Err(IdentityError::Unavailable("JWT secret not configured".to_string()));
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<SessionClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "admin@hbm.com".to_string(),
            role,
            name: Some("Ada".to_string()),
            avatar: None,
        }
    }

    #[test]
    fn roles_parse_exactly() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("lecturer".parse::<Role>(), Ok(Role::Lecturer));
        assert_eq!("student".parse::<Role>(), Ok(Role::Student));
        assert!("Admin".parse::<Role>().is_err());
        assert!("superadmin".parse::<Role>().is_err());
    }

    #[test]
    fn token_round_trips_principal() {
        let original = principal(Role::Admin);
        let token = issue_session_token(&SessionClaims::new(&original, 1).unwrap(), "secret").unwrap();

        let claims = decode_session_token(&token, "secret").unwrap();
        let decoded = Principal::try_from(claims).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = issue_session_token(&SessionClaims::new(&principal(Role::Admin), 1).unwrap(), "secret").unwrap();
        assert!(matches!(
            decode_session_token(&token, "other"),
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = SessionClaims::new(&principal(Role::Admin), 1).unwrap();
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = issue_session_token(&claims, "secret").unwrap();
        assert!(decode_session_token(&token, "secret").is_err());
    }

    #[test]
    fn unknown_role_claim_is_malformed() {
        let mut claims = SessionClaims::new(&principal(Role::Admin), 1).unwrap();
        claims.role = "root".to_string();
        assert!(matches!(
            Principal::try_from(claims),
            Err(IdentityError::Malformed(_))
        ));
    }

    #[test]
    fn lifetime_that_would_wrap_is_rejected() {
        let result = SessionClaims::new(&principal(Role::Admin), u64::MAX);
        assert!(matches!(result, Err(TokenError::InvalidLifetime(u64::MAX))));
    }

    #[test]
    fn lifetime_past_chrono_range_is_rejected() {
        let result = SessionClaims::new(&principal(Role::Admin), 1_000_000_000_000);
        assert!(matches!(result, Err(TokenError::InvalidLifetime(1_000_000_000_000))));
    }

    #[test]
    fn zero_lifetime_is_rejected() {
        assert!(matches!(
            SessionClaims::new(&principal(Role::Admin), 0),
            Err(TokenError::InvalidLifetime(0))
        ));
    }

    #[test]
    fn expiry_lands_after_issue() {
        let claims = SessionClaims::new(&principal(Role::Admin), 4).unwrap();
        assert_eq!(claims.exp - claims.iat, 4 * 3600);
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let claims = SessionClaims::new(&principal(Role::Admin), 1).unwrap();
        assert!(matches!(issue_session_token(&claims, ""), Err(TokenError::InvalidSecret)));
    }
}
