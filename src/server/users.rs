use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{Identity, policy};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{AdminStatusResponse, GrantAdminRequest, UserPayload};
use crate::server::response::{ApiError, InsertResult, StoreResultExt, UpdateResult};
use crate::server::validation::validate_email;
use crate::types::User;

/// Public admin query: reports whether the given email holds the admin
/// role, so the client can decide which UI to show. Unknown emails are
/// plain non-admins, not errors.
pub async fn admin_status(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    let admin =
        policy::is_admin(state.store.as_ref(), &email).api_err("Failed to look up user")?;
    Ok(Json(AdminStatusResponse { admin }))
}

fn user_from_payload(payload: UserPayload) -> Result<User, ApiError> {
    validate_email(&payload.email)?;

    let mut attributes = payload.attributes;
    // Roles are granted, never self-asserted through a sign-in payload.
    attributes.remove("role");

    Ok(User {
        email: payload.email,
        role: None,
        attributes,
    })
}

/// First sign-in with email/password registration.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = user_from_payload(payload)?;

    match state.store.create_user(&user) {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(InsertResult {
                inserted_id: user.email,
            }),
        )),
        Err(Error::AlreadyExists) => Err(ApiError::conflict("User already exists")),
        Err(_) => Err(ApiError::internal("Failed to create user")),
    }
}

/// Repeat sign-in (third-party providers): upsert keyed by email, so the
/// same account signing in twice still yields a single document.
pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<UpdateResult>, ApiError> {
    let user = user_from_payload(payload)?;

    let inserted = state
        .store
        .upsert_user(&user)
        .api_err("Failed to upsert user")?;

    let result = if inserted {
        UpdateResult::upserted(user.email)
    } else {
        UpdateResult::matched(1)
    };
    Ok(Json(result))
}

/// Admin role grant. Requires a verified identity outright; beyond that,
/// the store applies the role change only if the requester's own record
/// holds the admin role, in one atomic conditional update. A zero-match
/// result means nothing changed.
pub async fn grant_admin(
    Identity(identity): Identity,
    State(state): State<Arc<AppState>>,
    Json(req): Json<GrantAdminRequest>,
) -> Result<Json<UpdateResult>, ApiError> {
    let Some(requester) = identity else {
        return Err(ApiError::unauthorized("You don't have access to make Admin"));
    };

    let matched = state
        .store
        .grant_admin(&requester, &req.email)
        .api_err("Failed to update role")?;

    if matched == 0 {
        tracing::info!(
            "Admin grant by {} for {} matched no documents",
            requester,
            req.email
        );
    }

    Ok(Json(UpdateResult::matched(matched as u64)))
}
