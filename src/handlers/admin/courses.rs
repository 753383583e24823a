// handlers/admin/courses.rs - PATCH /api/admin/courses/:id
//
// Admins may edit any course; a course owner may edit their own. Either way
// the caller must be on the admin allowlist. The body is only inspected once
// the caller is authorized, so anonymous requests always get 401.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::HeaderMap,
    Json,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::course::{self, Course, CourseChanges};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn update_course(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<CourseChanges>, JsonRejection>,
) -> ApiResult<Course> {
    let database = &state.database;
    let course_id = path.as_ref().ok().map(|Path(id)| *id);
    let principal = state
        .guard
        .authorize_owner_or_admin(&headers, move || async move {
            // An unparseable id owns nothing.
            let Some(id) = course_id else {
                return Ok(None);
            };
            let pool = database.pool()?;
            Ok::<_, ApiError>(course::find(pool, id).await?)
        })
        .await?
        .into_result()?;

    let Path(id) = path.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let Json(changes) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    validate_changes(&changes)?;

    let updated = course::update(state.database.pool()?, id, &changes, principal.id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Course '{}' not found", id)))?;

    tracing::info!(course = %id, updated_by = %principal.id, "Course updated");
    Ok(ApiResponse::success(updated))
}

fn validate_changes(changes: &CourseChanges) -> Result<(), ApiError> {
    if changes.title.is_none() && changes.description.is_none() {
        return Err(ApiError::bad_request("Nothing to update: provide title or description"));
    }

    if let Some(title) = &changes.title {
        if title.trim().is_empty() {
            let mut field_errors = HashMap::new();
            field_errors.insert("title".to_string(), "Title must not be empty".to_string());
            return Err(ApiError::validation_error("Invalid course update", Some(field_errors)));
        }
    }

    Ok(())
}
