use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::Session;

pub struct AuthService;

impl AuthService {
    pub fn hash_password(password: &str) -> crate::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| crate::Error::Internal(format!("Failed to hash password: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    pub fn verify_password(password: &str, password_hash: &str) -> crate::Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| crate::Error::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hashes on the blocking pool so argon2 does not stall the async workers.
    pub async fn hash_password_blocking(password: String) -> crate::Result<String> {
        tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(|e| crate::Error::Internal(format!("Password hashing task failed: {}", e)))?
    }

    pub async fn verify_password_blocking(
        password: String,
        password_hash: String,
    ) -> crate::Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify_password(&password, &password_hash))
            .await
            .map_err(|e| {
                crate::Error::Internal(format!("Password verification task failed: {}", e))
            })?
    }

    pub fn generate_session_token() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    /// A fresh session for `user_id` that expires `ttl` after `now`.
    pub fn new_session(user_id: Uuid, now: DateTime<Utc>, ttl: chrono::Duration) -> Session {
        Session {
            token: Self::generate_session_token(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = AuthService::hash_password(password).unwrap();

        assert!(AuthService::verify_password(password, &hash).unwrap());
        assert!(!AuthService::verify_password("wrong_password", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_password_hashing_off_the_runtime() {
        let hash = AuthService::hash_password_blocking("test_password_123".to_string())
            .await
            .unwrap();

        let right = "test_password_123".to_string();
        assert!(AuthService::verify_password_blocking(right, hash.clone())
            .await
            .unwrap());
        assert!(!AuthService::verify_password_blocking("wrong_password".to_string(), hash)
            .await
            .unwrap());
        assert!(
            AuthService::verify_password_blocking("secret".to_string(), "bogus".to_string())
                .await
                .is_err()
        );
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(AuthService::verify_password("secret", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_session_tokens_are_unique() {
        let a = AuthService::generate_session_token();
        let b = AuthService::generate_session_token();

        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_session_expiry() {
        let now = Utc::now();
        let session = AuthService::new_session(Uuid::new_v4(), now, chrono::Duration::days(7));

        assert!(session.is_valid_at(now));
        assert!(!session.is_valid_at(now + chrono::Duration::days(7)));
    }
}
