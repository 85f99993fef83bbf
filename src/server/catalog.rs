use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{ReviewPayload, WatchPayload};
use crate::server::response::{ApiError, DeleteResult, InsertResult, StoreResultExt};
use crate::types::{Review, Watch};

pub async fn list_watches(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Watch>>, ApiError> {
    let watches = state.store.list_watches().api_err("Failed to list watches")?;
    Ok(Json(watches))
}

/// Returns the watch document, or JSON null when the id is unknown.
pub async fn get_watch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Option<Watch>>, ApiError> {
    let watch = state.store.get_watch(&id).api_err("Failed to get watch")?;
    Ok(Json(watch))
}

pub async fn add_watch(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WatchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let watch = Watch {
        id: Uuid::new_v4().to_string(),
        attributes: payload.attributes,
    };

    state
        .store
        .create_watch(&watch)
        .api_err("Failed to add product")?;

    Ok((
        StatusCode::CREATED,
        Json(InsertResult {
            inserted_id: watch.id,
        }),
    ))
}

pub async fn delete_watch(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let deleted = state
        .store
        .delete_watch(&id)
        .api_err("Failed to delete watch")?;

    Ok(Json(DeleteResult {
        deleted_count: u64::from(deleted),
    }))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = state.store.list_reviews().api_err("Failed to list reviews")?;
    Ok(Json(reviews))
}

pub async fn add_review(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let review = Review {
        id: Uuid::new_v4().to_string(),
        attributes: payload.attributes,
    };

    state
        .store
        .create_review(&review)
        .api_err("Failed to add review")?;

    Ok((
        StatusCode::CREATED,
        Json(InsertResult {
            inserted_id: review.id,
        }),
    ))
}
