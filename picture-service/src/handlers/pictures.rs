use crate::dtos::{normalize, parse_picture_body, InsertResponse, MessageResponse};
use crate::services::InsertOutcome;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("Picture with id {} not found", id))
}

fn already_present(id: i64) -> AppError {
    AppError::duplicate(format!("picture with id {} already present", id))
}

/// Number of stored pictures.
///
/// An empty collection is answered with 500, same as a database failure.
/// Existing clients depend on that, so it stays.
pub async fn count_pictures(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    match state.store.count().await {
        Ok(count) if count > 0 => Ok(Json(count)),
        Ok(_) => {
            tracing::warn!("Picture collection is empty, reporting count as an error");
            Err(AppError::InternalError(anyhow::anyhow!(
                "picture collection is empty"
            )))
        }
        Err(e) => {
            tracing::error!("Failed to count pictures: {}", e);
            Err(AppError::InternalError(e.into()))
        }
    }
}

pub async fn list_pictures(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let pictures = state.store.find_all().await.map_err(|e| {
        tracing::error!("Failed to list pictures: {}", e);
        e
    })?;

    Ok(Json(pictures.into_iter().map(normalize).collect::<Vec<_>>()))
}

pub async fn get_picture(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let picture = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(normalize(picture)))
}

pub async fn create_picture(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let picture = parse_picture_body(&body)?;

    if state.store.find_by_id(picture.id).await?.is_some() {
        return Err(already_present(picture.id));
    }

    // The unique index still catches a concurrent create that slipped past
    // the lookup above.
    match state.store.insert(&picture).await? {
        InsertOutcome::Inserted(inserted_id) => {
            tracing::info!(picture_id = picture.id, "Picture created");
            Ok((StatusCode::CREATED, Json(InsertResponse::from(inserted_id))))
        }
        InsertOutcome::Duplicate => {
            tracing::warn!(picture_id = picture.id, "Duplicate key on picture insert");
            Err(already_present(picture.id))
        }
    }
}

/// Replace the content fields of a picture.
///
/// The body `id` must equal the path `id`. Returns 200 with a message when
/// nothing differs, otherwise 201 with the refreshed document.
pub async fn update_picture(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Response, AppError> {
    let picture = parse_picture_body(&body)?;

    if picture.id != id {
        return Err(AppError::bad_request(format!(
            "Body id {} does not match path id {}",
            picture.id, id
        )));
    }

    let existing = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    if picture.content_matches(&existing) {
        return Ok((
            StatusCode::OK,
            Json(MessageResponse::new("Picture found, but no changes made")),
        )
            .into_response());
    }

    state.store.update(id, &picture).await.map_err(|e| {
        tracing::error!(picture_id = id, "Failed to update picture: {}", e);
        e
    })?;

    // A concurrent delete can remove the document between update and re-read.
    let updated = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(picture_id = id, "Picture updated");
    Ok((StatusCode::CREATED, Json(normalize(updated))).into_response())
}

/// Delete a picture. Responds 204; hyper drops the confirmation body on the
/// wire for that status.
pub async fn delete_picture(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete(id).await? {
        return Err(not_found(id));
    }

    tracing::info!(picture_id = id, "Picture deleted");
    Ok((
        StatusCode::NO_CONTENT,
        Json(MessageResponse::new(format!(
            "Picture with id {} deleted successfully",
            id
        ))),
    ))
}
