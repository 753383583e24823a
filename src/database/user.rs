use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DatabaseError;
use crate::auth::{IdentityError, Principal, Role};

/// Row from the `users` table as the identity provider keeps it.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRow {
    /// A row whose role is not one of the platform roles is treated as a
    /// malformed session, never as a default role.
    pub fn into_principal(self) -> Result<Principal, IdentityError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| IdentityError::Malformed(e.to_string()))?;

        Ok(Principal {
            id: self.id,
            email: self.email,
            role,
            name: self.name,
            avatar: self.avatar,
        })
    }
}

/// Load a user that has not been soft-deleted.
pub async fn find_active(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>, DatabaseError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, email, role, name, avatar, deleted_at
        FROM users
        WHERE id = $1
        AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
