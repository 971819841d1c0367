//! Password hashing and verification using Argon2.
//!
//! Hashes are stored as PHC strings (`$argon2id$...`), salted per user, so
//! the same password never produces the same stored hash twice.

use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

// ---

/// Hash a password for storage in the `users` table.
pub fn hash_password(password: &str) -> Result<String> {
    // ---
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC hash string.
///
/// Returns `Ok(false)` on a plain mismatch; a malformed stored hash is an
/// error rather than a silent rejection.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    // ---
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("Password verification failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_hash_then_verify_round_trip() {
        // ---
        let hash = hash_password("inspector-7").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("inspector-7", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        // ---
        let hash = hash_password("inspector-7").unwrap();
        assert!(!verify_password("inspector-8", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        // ---
        // Per-user salts: equal passwords must not share a stored hash.
        let first = hash_password("admin123").unwrap();
        let second = hash_password("admin123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_stored_hash_is_an_error() {
        // ---
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }
}
