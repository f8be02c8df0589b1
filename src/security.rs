//! security
//! --------
//! Password hashing and token key generation. Passwords are stored as argon2
//! PHC strings; token keys are 40-character lowercase hex strings minted from
//! 20 bytes of OS randomness.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::error::{AppError, AppResult};

pub fn hash_password(password: &str) -> AppResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AppError::internal("rng".to_string(), e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::internal("hash".to_string(), e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal("hash".to_string(), e.to_string()))?
        .to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

/// Mint a fresh token key: 20 random bytes rendered as 40 lowercase hex chars.
pub fn generate_token_key() -> AppResult<String> {
    let mut bytes = [0u8; 20];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| AppError::internal("rng".to_string(), e.to_string()))?;
    let mut key = String::with_capacity(40);
    for b in bytes.iter() {
        use std::fmt::Write as _;
        let _ = write!(key, "{b:02x}");
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let phc = hash_password("s3cret!").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify_password(&phc, "s3cret!"));
        assert!(!verify_password(&phc, "S3cret!"));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }

    #[test]
    fn token_keys_are_40_hex_chars() {
        let a = generate_token_key().unwrap();
        let b = generate_token_key().unwrap();
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }
}
