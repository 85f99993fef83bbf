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
use crate::server::dto::PurchasePayload;
use crate::server::response::{ApiError, DeleteResult, InsertResult, StoreResultExt, UpdateResult};
use crate::types::Purchase;

pub async fn create_purchase(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut attributes = payload.attributes;
    // A new order is always unshipped; the status field only ever appears
    // through the admin ship transition.
    attributes.remove("status");

    let purchase = Purchase {
        id: Uuid::new_v4().to_string(),
        email: payload.email,
        status: None,
        attributes,
    };

    state
        .store
        .create_purchase(&purchase)
        .api_err("Failed to create purchase")?;

    Ok((
        StatusCode::CREATED,
        Json(InsertResult {
            inserted_id: purchase.id,
        }),
    ))
}

/// All purchases owned by the given email. Ownership is the document's
/// own email field, as asserted at order time.
pub async fn my_purchases(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Purchase>>, ApiError> {
    let purchases = state
        .store
        .list_purchases_by_email(&email)
        .api_err("Failed to list purchases")?;
    Ok(Json(purchases))
}

/// Customer-side cancellation: the order document is removed outright.
/// Unknown ids report zero deletions rather than an error.
pub async fn cancel_purchase(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let deleted = state
        .store
        .delete_purchase(&id)
        .api_err("Failed to cancel purchase")?;

    Ok(Json(DeleteResult {
        deleted_count: u64::from(deleted),
    }))
}

pub async fn all_purchases(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Purchase>>, ApiError> {
    let purchases = state
        .store
        .list_purchases()
        .api_err("Failed to list purchases")?;
    Ok(Json(purchases))
}

pub async fn admin_cancel_purchase(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let deleted = state
        .store
        .delete_purchase(&id)
        .api_err("Failed to cancel purchase")?;

    Ok(Json(DeleteResult {
        deleted_count: u64::from(deleted),
    }))
}

/// Admin ship transition. Matching zero documents means the id does not
/// exist; the response reports that instead of erroring.
pub async fn ship_purchase(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    let matched = state
        .store
        .mark_purchase_shipped(&id)
        .api_err("Failed to update purchase status")?;

    Ok(Json(UpdateResult::matched(matched as u64)))
}
