use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DatabaseError;
use crate::auth::OwnedResource;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for Course {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
}

/// Fields an editor may change. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Course>, DatabaseError> {
    let course = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, owner_id, title, description, updated_by, updated_at
        FROM courses
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(course)
}

/// Apply `changes` and stamp `updated_by`. Returns `None` if the course is gone.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &CourseChanges,
    updated_by: Uuid,
) -> Result<Option<Course>, DatabaseError> {
    let course = sqlx::query_as::<_, Course>(
        r#"
        UPDATE courses
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            updated_by = $4,
            updated_at = now()
        WHERE id = $1
        RETURNING id, owner_id, title, description, updated_by, updated_at
        "#,
    )
    .bind(id)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(updated_by)
    .fetch_optional(pool)
    .await?;

    Ok(course)
}
