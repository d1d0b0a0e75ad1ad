use super::AuthError;

/// Hash a password with bcrypt at the given work factor.
///
/// CPU-bound for hundreds of milliseconds at production costs; call it from
/// `spawn_blocking` inside async code.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check `password` against a stored bcrypt hash. A hash that bcrypt cannot
/// parse is an error, not a mismatch.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, stored).map_err(|_| AuthError::MalformedHash)
}
