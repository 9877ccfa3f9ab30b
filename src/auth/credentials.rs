//! Credential verification
//!
//! Two kinds of stored password hashes are understood: a plain SHA-256 hex
//! digest (the same transform exposed by [`CredentialVerifier::hash`]) and
//! Argon2 PHC strings produced by [`hash_password`].

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::auth::user::{SharedUserRepository, UserRecord};
use crate::error::{Result, RustyAuthError};
use crate::security::constant_time_eq;

const ARGON2_PREFIX: &str = "$argon2";

/// Hash a password into an Argon2 PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_argon2(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("Stored Argon2 hash could not be parsed: {}", e);
            false
        }
    }
}

/// Argon2 hash checked when the username is unknown, so a miss pays for a
/// full password verification like a hit does
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| match hash_password("rusty-auth-unknown-user") {
        Ok(phc) => phc,
        Err(e) => {
            log::error!("Failed to build dummy Argon2 hash: {}", e);
            CredentialVerifier::hash("rusty-auth-unknown-user")
        }
    })
}

/// Validates username/password pairs against the user repository
pub struct CredentialVerifier {
    users: SharedUserRepository,
}

impl CredentialVerifier {
    pub fn new(users: SharedUserRepository) -> Self {
        dummy_hash();
        Self { users }
    }

    /// SHA-256 of the input as lower-case hex
    pub fn hash(secret: &str) -> String {
        format!("{:x}", Sha256::digest(secret.as_bytes()))
    }

    /// Compare `hash(secret)` against `digest` without an early exit
    pub fn equals(secret: &str, digest: &str) -> bool {
        constant_time_eq(&Self::hash(secret), &digest.to_ascii_lowercase())
    }

    /// Check a password against whatever kind of hash is stored
    pub fn password_matches(password: &str, stored: &str) -> bool {
        if stored.starts_with(ARGON2_PREFIX) {
            verify_argon2(password, stored)
        } else {
            Self::equals(password, stored)
        }
    }

    /// Resolve the account for a username/password pair.
    ///
    /// Unknown user, wrong password and inactive account all return
    /// `InvalidCredentials`; only repository failures surface differently.
    pub async fn verify(&self, username: &str, password: &str) -> Result<UserRecord> {
        if username.is_empty() || password.is_empty() {
            return Err(RustyAuthError::InvalidCredentials);
        }

        let record = match self.users.find_by_username(username).await? {
            Some(record) => record,
            None => {
                let _ = Self::password_matches(password, dummy_hash());
                return Err(RustyAuthError::InvalidCredentials);
            }
        };

        if !Self::password_matches(password, &record.password_hash) {
            return Err(RustyAuthError::InvalidCredentials);
        }

        if !record.is_active {
            log::debug!("Login refused for inactive account {}", record.id);
            return Err(RustyAuthError::InvalidCredentials);
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::user::{MemoryUserRepository, UserRecord};
    use std::sync::Arc;

    async fn verifier_with(users: Vec<UserRecord>) -> CredentialVerifier {
        let repo = MemoryUserRepository::new();
        for user in users {
            repo.insert(user).await.unwrap();
        }
        CredentialVerifier::new(Arc::new(repo))
    }

    #[test]
    fn test_hash_is_deterministic_sha256() {
        assert_eq!(CredentialVerifier::hash("x"), CredentialVerifier::hash("x"));
        assert_eq!(
            CredentialVerifier::hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(CredentialVerifier::hash("").len(), 64);
    }

    #[test]
    fn test_equals() {
        let digest = CredentialVerifier::hash("admin");
        assert!(CredentialVerifier::equals("admin", &digest));
        assert!(CredentialVerifier::equals("admin", &digest.to_uppercase()));
        assert!(!CredentialVerifier::equals("admin2", &digest));
        assert!(!CredentialVerifier::equals("admin", "not-a-digest"));
        assert!(!CredentialVerifier::equals("admin", ""));
    }

    #[test]
    fn test_argon2_hashes() {
        let phc = hash_password("correct horse").unwrap();
        assert!(phc.starts_with(ARGON2_PREFIX));
        assert!(CredentialVerifier::password_matches("correct horse", &phc));
        assert!(!CredentialVerifier::password_matches("wrong horse", &phc));
        assert!(!CredentialVerifier::password_matches("x", "$argon2id$garbage"));
    }

    #[test]
    fn test_unknown_users_check_an_argon2_hash() {
        let dummy = dummy_hash();
        assert!(dummy.starts_with(ARGON2_PREFIX));
        assert!(PasswordHash::new(dummy).is_ok());
        assert!(!CredentialVerifier::password_matches("", dummy));
        assert!(!CredentialVerifier::password_matches("admin", dummy));
    }

    #[tokio::test]
    async fn test_verify_outcomes() {
        let mut inactive = UserRecord::new(
            "2".to_string(),
            "sleeper".to_string(),
            CredentialVerifier::hash("pw"),
        );
        inactive.is_active = false;
        let verifier = verifier_with(vec![
            UserRecord::new("1".to_string(), "admin".to_string(), CredentialVerifier::hash("admin")),
            inactive,
        ])
        .await;

        assert_eq!(verifier.verify("admin", "admin").await.unwrap().id, "1");

        for (user, pass) in [("admin", "xyz"), ("xyz", "admin"), ("sleeper", "pw"), ("admin", ""), ("", "admin")] {
            assert!(
                matches!(verifier.verify(user, pass).await, Err(RustyAuthError::InvalidCredentials)),
                "{}/{}",
                user,
                pass
            );
        }
    }
}
