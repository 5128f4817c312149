//! Password hashing using Argon2id
//!
//! Digests are PHC strings carrying their own salt and parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use shici_common::{Error, Result};

/// One-way password digest capability
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// True if `plaintext` produced `digest`. A malformed digest is an error.
    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool>;
}

/// Argon2id with the crate's recommended default parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Internal(format!("Failed to hash password: {e}")))
    }

    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| Error::Internal(format!("Invalid password hash format: {e}")))?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher;
        let digest = hasher.hash("明月几时有").unwrap();

        assert!(digest.starts_with("$argon2"));
        assert!(hasher.verify(&digest, "明月几时有").unwrap());
        assert!(!hasher.verify(&digest, "把酒问青天").unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = Argon2Hasher;
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_malformed_digest() {
        assert!(Argon2Hasher.verify("not-a-phc-string", "x").is_err());
    }
}
