mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the document-store interface: four domain collections
/// plus the identity provider's credential table.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Watch operations
    fn create_watch(&self, watch: &Watch) -> Result<()>;
    fn get_watch(&self, id: &str) -> Result<Option<Watch>>;
    fn list_watches(&self) -> Result<Vec<Watch>>;
    fn delete_watch(&self, id: &str) -> Result<bool>;

    // Purchase operations
    fn create_purchase(&self, purchase: &Purchase) -> Result<()>;
    fn get_purchase(&self, id: &str) -> Result<Option<Purchase>>;
    fn list_purchases(&self) -> Result<Vec<Purchase>>;
    fn list_purchases_by_email(&self, email: &str) -> Result<Vec<Purchase>>;
    /// Marks a purchase shipped. Returns the number of documents matched;
    /// zero means the id did not exist and nothing changed.
    fn mark_purchase_shipped(&self, id: &str) -> Result<usize>;
    fn delete_purchase(&self, id: &str) -> Result<bool>;

    // Review operations
    fn create_review(&self, review: &Review) -> Result<()>;
    fn list_reviews(&self) -> Result<Vec<Review>>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Sign-in upsert keyed by email. Only the profile attributes are
    /// written on conflict; an existing role is left untouched. Returns
    /// true when a new document was inserted.
    fn upsert_user(&self, user: &User) -> Result<bool>;
    /// Sets the target's role to admin in a single conditional statement:
    /// the write happens only if the requester's stored role is admin at
    /// execution time. Returns the number of documents matched (0 when the
    /// requester is not an admin or the target does not exist).
    fn grant_admin(&self, requester_email: &str, target_email: &str) -> Result<usize>;
    fn has_admin_user(&self) -> Result<bool>;

    // Identity token operations
    fn create_identity_token(&self, token: &IdentityToken) -> Result<()>;
    fn get_identity_token_by_lookup(&self, lookup: &str) -> Result<Option<IdentityToken>>;
    fn delete_identity_token(&self, id: &str) -> Result<bool>;
    fn update_identity_token_last_used(&self, id: &str) -> Result<()>;

    fn close(&self) -> Result<()>;
}
