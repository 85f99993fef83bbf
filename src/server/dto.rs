use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::IdentityToken;

/// Product payload from the dashboard; the id is assigned server-side.
#[derive(Debug, Deserialize)]
pub struct WatchPayload {
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Order payload from the storefront. The email is the self-asserted
/// owner of the purchase; everything else is free-form order detail.
#[derive(Debug, Deserialize)]
pub struct PurchasePayload {
    pub email: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Profile payload from either sign-in path.
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub email: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct GrantAdminRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AdminStatusResponse {
    pub admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub email: String,
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct IssueTokenResponse {
    pub token: String,
    pub metadata: IdentityToken,
}
