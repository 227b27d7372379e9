//! Password hashing and verification for the `local` login strategy.

use sentinel_core::error::{SentinelError, SentinelResult};

const DEFAULT_BCRYPT_COST: u32 = 10;

/// Hash a plaintext password for storage in [`sentinel_core::model::User::password_hash`],
/// using the default bcrypt cost.
pub fn hash_password(password: &str) -> SentinelResult<String> {
    hash_password_with_cost(password, DEFAULT_BCRYPT_COST)
}

/// Hash a plaintext password with an explicit bcrypt cost, e.g. from
/// [`sentinel_core::config::AuthConfig::bcrypt_cost`].
pub fn hash_password_with_cost(password: &str, cost: u32) -> SentinelResult<String> {
    bcrypt::hash(password, cost).map_err(|e| SentinelError::fatal(format!("password hashing failed: {e}")))
}

/// Compare a plaintext password against a stored bcrypt hash.
///
/// Returns `Ok(())` on match, `Authorization` error otherwise - both a wrong
/// password and a malformed hash are reported identically so callers can't
/// distinguish "bad password" from "corrupt record" via timing or message.
pub fn verify_password(password: &str, hash: &str) -> SentinelResult<()> {
    let ok = bcrypt::verify(password, hash)
        .map_err(|_| SentinelError::authorization("invalid credentials"))?;
    if !ok {
        return Err(SentinelError::authorization("invalid credentials"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrips() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("wrong password", &hash).is_err());
    }

    #[test]
    fn malformed_hash_is_rejected_not_panicked() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn hashes_are_salted_differently_each_time() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }
}
