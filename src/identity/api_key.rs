//! Terminal API-key hashing and verification.
//!
//! spec.md §6: a hashed `apiKey` is stored per terminal; verification is
//! constant-time. Grounded on `user_auth/service.rs`'s use of `argon2` for
//! password hashing — the same primitive, reused here for API keys instead
//! of passwords, gives constant-time verification for free (argon2's
//! `PasswordVerifier` compares digests in constant time).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;

use crate::error::CoreError;

/// Generate a new random API key (the plaintext given to the terminal
/// operator once, at provisioning time).
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 24];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("tk_{}", hex::encode(bytes))
}

/// Hash a plaintext API key for storage (`Terminal.apiKey` column).
pub fn hash_api_key(plaintext: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| CoreError::Internal(format!("failed to hash api key: {e}")))
}

/// Verify a plaintext API key against the stored hash. Constant-time by
/// construction (argon2's digest comparison does not short-circuit).
pub fn verify_api_key(plaintext: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_generated_key() {
        let key = generate_api_key();
        let hash = hash_api_key(&key).unwrap();
        assert!(verify_api_key(&key, &hash));
    }

    #[test]
    fn rejects_wrong_key() {
        let hash = hash_api_key("correct-key").unwrap();
        assert!(!verify_api_key("wrong-key", &hash));
    }
}
