use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The only role value that carries privilege. Anything else on a user
/// record, including no role at all, means ordinary customer.
pub const ADMIN_ROLE: &str = "admin";

/// A catalog product. Everything beyond the id is client-shaped: the
/// storefront decides what a watch document looks like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watch {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Shipment state of a purchase. A purchase with no status is still
/// awaiting shipment; there is no transition back out of `Shipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseStatus {
    Shipped,
}

impl PurchaseStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shipped => "Shipped",
        }
    }
}

/// A purchase order. Ownership is the `email` field; cancellation deletes
/// the document outright rather than marking it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PurchaseStatus>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A user profile, keyed by email. The role field is written only by the
/// admin grant path and the init bootstrap, never from sign-in payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

/// An identity credential bound to a user email. The raw token is shown
/// once at mint time; only its hash and lookup prefix are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityToken {
    pub id: String,
    pub email: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}
