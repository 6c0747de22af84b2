use argon2::password_hash::{PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, Version};
use rand::Rng;
use rand_core::OsRng;
use tracing::instrument;

use crate::errors::ApiError;

#[derive(Debug, Clone, Default)]
pub struct CryptoService;

impl CryptoService {
    fn argon2() -> Result<Argon2<'static>, ApiError> {
        let params = Params::new(
            32_768, // 32 MB
            3,      // iterations
            1,      // parallelism
            None,
        )
        .map_err(|e| ApiError::Hashing(format!("Failed to create Argon2 params: {e}")))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    #[instrument(skip(self, password))]
    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Self::argon2()?;

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Hashing(format!("Failed to hash password: {e}")))?
            .to_string();

        Ok(hash)
    }

    #[instrument(skip(self, password, hash))]
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| ApiError::Hashing(format!("Invalid password hash format: {e}")))?;

        let argon2 = Self::argon2()?;

        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ApiError::Hashing(format!("Password verification failed: {e}"))),
        }
    }

    /// 6-digit numeric OTP, uniform over 100000..=999999.
    pub fn generate_otp_code(&self) -> String {
        let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
        code.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let crypto = CryptoService;
        let hash = crypto.hash_password("secret1").unwrap();
        assert_ne!(hash, "secret1");
        assert!(crypto.verify_password("secret1", &hash).unwrap());
        assert!(!crypto.verify_password("secret2", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let crypto = CryptoService;
        let first = crypto.hash_password("secret1").unwrap();
        let second = crypto.hash_password("secret1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn otp_codes_are_six_digits() {
        let crypto = CryptoService;
        for _ in 0..100 {
            let code = crypto.generate_otp_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_mismatch() {
        let crypto = CryptoService;
        assert!(crypto.verify_password("secret1", "not-a-phc-string").is_err());
    }
}
