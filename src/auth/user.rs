use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Result, RustyAuthError};

/// Stored account as seen by the credential check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique user identifier
    pub id: String,
    /// Login name, unique within the repository
    pub username: String,
    /// SHA-256 hex digest or Argon2 PHC string
    pub password_hash: String,
    /// Inactive accounts cannot log in
    pub is_active: bool,
}

impl UserRecord {
    pub fn new(id: String, username: String, password_hash: String) -> Self {
        Self {
            id,
            username,
            password_hash,
            is_active: true,
        }
    }
}

/// Source of truth for credentials and account status.
/// The engine only ever reads from it.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
}

/// In-memory user repository for development and testing
pub struct MemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Add a user. Fails if the username is taken.
    pub async fn insert(&self, user: UserRecord) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(RustyAuthError::StorageError(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    /// Flip the active flag of an account
    pub async fn set_active(&self, username: &str, is_active: bool) -> Result<()> {
        let mut users = self.users.write().await;
        match users.get_mut(username) {
            Some(user) => {
                user.is_active = is_active;
                Ok(())
            }
            None => Err(RustyAuthError::NotFound(format!("user '{}'", username))),
        }
    }

    pub async fn remove(&self, username: &str) -> Option<UserRecord> {
        self.users.write().await.remove(username)
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(username).cloned())
    }
}

/// Shared reference to a user repository
pub type SharedUserRepository = Arc<dyn UserRepository>;
