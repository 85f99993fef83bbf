use crate::error::Result;
use crate::store::Store;

/// Returns true iff a user document exists for `email` and its role is
/// exactly "admin". Missing users and every other role value are plain
/// customers.
pub fn is_admin(store: &dyn Store, email: &str) -> Result<bool> {
    Ok(store
        .get_user_by_email(email)?
        .is_some_and(|user| user.is_admin()))
}
