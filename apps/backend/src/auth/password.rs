//! Argon2id password hashing. Comparison inside `verify_password` is
//! constant-time (argon2 compares digests with `subtle`).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to hash password: {0}")]
pub struct PasswordHashError(String);

/// Hash `password` with a fresh random salt into a PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordHashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// True iff `password` matches the PHC string `hash`.
///
/// An unparseable stored hash is treated as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("p1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("p1", &hash));
    }

    #[test]
    fn other_plaintexts_do_not_verify() {
        let hash = hash_password("correct horse").unwrap();
        for wrong in ["", "correct", "correct horse ", "Correct horse", "p1"] {
            assert!(!verify_password(wrong, &hash), "{wrong:?} verified");
        }
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), b.len());
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }
}
