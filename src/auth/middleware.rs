use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::policy;
use crate::server::AppState;

/// The auth gate. Extraction always succeeds: a request with no
/// Authorization header, a non-bearer scheme, or a token the identity
/// provider rejects simply carries no identity. Handlers that care about
/// who is calling inspect the inner option.
pub struct Identity(pub Option<String>);

/// Extractor that requires a verified identity whose user record holds
/// the admin role.
pub struct RequireAdmin(pub String);

#[derive(Debug)]
pub enum AuthError {
    MissingIdentity,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingIdentity => {
                (StatusCode::UNAUTHORIZED, "Verified identity required")
            }
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                HeaderValue::from_static("Bearer realm=\"timekeeper\""),
            );
        }

        response
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Runs the gate: header -> identity provider -> verified email. Every
/// failure mode collapses to "no identity"; verification is advisory and
/// never fails the request on its own.
fn verified_email(parts: &Parts, state: &Arc<AppState>) -> Option<String> {
    let raw_token = bearer_token(parts)?;
    match state.identity.verify(raw_token) {
        Ok(email) => email,
        Err(e) => {
            tracing::warn!("Identity verification failed: {e}");
            None
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Identity(verified_email(parts, state)))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let email = verified_email(parts, state).ok_or(AuthError::MissingIdentity)?;

        let admin = policy::is_admin(state.store.as_ref(), &email)
            .map_err(|_| AuthError::InternalError)?;
        if !admin {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(email))
    }
}
