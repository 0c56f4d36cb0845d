use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::error;

/// Argon2 hash with a fresh salt per call; the same plaintext never produces
/// the same digest twice.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// A wrong password is `Ok(false)`; only a malformed stored digest errors.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Raw password-reset token: 32 random bytes, hex encoded. Handed to the user
/// by email; only its digest is ever persisted.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Deterministic, unsalted digest of a raw reset token. Used as the lookup
/// key for the stored token, so it must be stable across calls. Never used
/// for passwords.
pub fn reset_token_digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn same_password_hashes_differently() {
        let hash_a = hash_password("Passw0rd!").expect("hash a");
        let hash_b = hash_password("Passw0rd!").expect("hash b");
        assert_ne!(hash_a, hash_b);
        assert_ne!(hash_a, "Passw0rd!");
    }

    #[test]
    fn reset_token_digest_is_deterministic() {
        let raw = generate_reset_token();
        assert_eq!(raw.len(), 64);
        assert_eq!(reset_token_digest(&raw), reset_token_digest(&raw));
        assert_ne!(reset_token_digest(&raw), raw);
    }

    #[test]
    fn reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }
}
