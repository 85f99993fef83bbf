use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{RequireAdmin, TokenGenerator};
use crate::server::AppState;
use crate::server::dto::{IssueTokenRequest, IssueTokenResponse};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::types::IdentityToken;

/// Mints an identity token for an existing user. The raw token appears in
/// this response and nowhere else; only its hash is stored.
pub async fn issue_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(seconds) = req.expires_in_seconds {
        if seconds < 0 {
            return Err(ApiError::bad_request(
                "expires_in_seconds cannot be negative",
            ));
        }
    }

    let user = state
        .store
        .get_user_by_email(&req.email)
        .api_err("Failed to look up user")?
        .or_not_found("User not found")?;

    let expires_at = req
        .expires_in_seconds
        .map(|s| Utc::now() + Duration::seconds(s));

    let generator = TokenGenerator::new();

    const MAX_RETRIES: u32 = 3;
    for _ in 0..MAX_RETRIES {
        let (raw_token, lookup, hash) = generator
            .generate()
            .map_err(|_| ApiError::internal("Failed to generate token"))?;

        let token = IdentityToken {
            id: Uuid::new_v4().to_string(),
            email: user.email.clone(),
            token_hash: hash,
            token_lookup: lookup,
            created_at: Utc::now(),
            expires_at,
            last_used_at: None,
        };

        match state.store.create_identity_token(&token) {
            Ok(()) => {
                return Ok((
                    StatusCode::CREATED,
                    Json(IssueTokenResponse {
                        token: raw_token,
                        metadata: token,
                    }),
                ));
            }
            Err(crate::error::Error::TokenLookupCollision) => continue,
            Err(_) => return Err(ApiError::internal("Failed to create token")),
        }
    }

    Err(ApiError::internal("Failed to create token after retries"))
}

pub async fn revoke_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .store
        .delete_identity_token(&id)
        .api_err("Failed to revoke token")?;

    if !deleted {
        return Err(ApiError::not_found("Token not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
