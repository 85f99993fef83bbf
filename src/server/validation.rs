use crate::server::response::ApiError;

const MAX_EMAIL_LEN: usize = 254;

/// Light shape check for emails used as document keys. Full address
/// validation is out of scope; this only rejects values that cannot key a
/// user document sensibly.
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::bad_request("Email is too long"));
    }
    if email.contains(char::is_whitespace) {
        return Err(ApiError::bad_request("Email cannot contain whitespace"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(ApiError::bad_request("Email must be a single address")),
    }
}
