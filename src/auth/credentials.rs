use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::RngCore;

use crate::error::{AppError, AppResult};

const SALT_LEN: usize = 16;

/// Turns passwords into stored hashes and checks them
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> AppResult<String>;

    /// False for a wrong password or a malformed stored hash
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Argon2id, stored as a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).
///
/// Cost parameters travel inside the stored hash, so hashes made with older
/// settings keep verifying after the defaults change.
#[derive(Clone, Default)]
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
}

impl Argon2CredentialHasher {
    /// Custom cost, memory in KiB. Tests use the minimum to stay fast.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AppError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| AppError::Internal(format!("Salt encoding failed: {}", e)))?;

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2CredentialHasher {
        Argon2CredentialHasher::with_cost(Params::MIN_M_COST, 1).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = cheap();
        let stored = hasher.hash("hunter2").unwrap();

        assert!(stored.starts_with("$argon2id$"));
        assert!(hasher.verify("hunter2", &stored));
        assert!(!hasher.verify("hunter3", &stored));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = cheap();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let hasher = cheap();
        for stored in ["", "plaintext", "$argon2id$v=19$garbage", "sha256$1$00$00"] {
            assert!(!hasher.verify("pw", stored), "{stored}");
        }
    }

    #[test]
    fn test_cost_read_from_stored_hash() {
        let stored = cheap().hash("pw").unwrap();
        let stronger = Argon2CredentialHasher::with_cost(Params::MIN_M_COST * 4, 2).unwrap();
        assert!(stronger.verify("pw", &stored));
    }

    #[test]
    fn test_rejects_invalid_cost() {
        assert!(Argon2CredentialHasher::with_cost(0, 0).is_err());
    }
}
