use crate::{CoreError, CoreResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A registered traveller. The credential hash never leaves this struct
/// through serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Signup payload, password already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `CoreError::EmailTaken` when the email is already registered.
    async fn create(&self, new_account: NewAccount) -> CoreResult<Account>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Account>>;

    async fn get(&self, id: Uuid) -> CoreResult<Option<Account>>;
}

/// Password hashing collaborator. Kept behind a trait so the API layer and
/// tests agree on one seam regardless of backend cost parameters.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> CoreResult<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id with default parameters and a per-password random salt.
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| CoreError::CredentialError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// In-memory account store for tests and local development.
#[derive(Default)]
pub struct MemoryAccounts {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn create(&self, new_account: NewAccount) -> CoreResult<Account> {
        let mut accounts = self.accounts.write().await;

        if accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&new_account.email))
        {
            return Err(CoreError::EmailTaken);
        }

        let account = Account {
            id: Uuid::new_v4(),
            first_name: new_account.first_name,
            last_name: new_account.last_name,
            email: new_account.email,
            phone: new_account.phone,
            password_hash: new_account.password_hash,
            created_at: Utc::now(),
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_signup(email: &str) -> NewAccount {
        NewAccount {
            first_name: "Kavlin".to_string(),
            last_name: "Sharma".to_string(),
            email: email.to_string(),
            phone: "9876543210".to_string(),
            password_hash: "fake-hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryAccounts::new();
        store.create(sample_signup("k@example.com")).await.unwrap();

        let err = store
            .create(sample_signup("K@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::EmailTaken));
    }

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let store = MemoryAccounts::new();
        let created = store.create(sample_signup("k@example.com")).await.unwrap();

        let found = store.find_by_email("K@EXAMPLE.COM").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test]
    fn test_argon2_roundtrip() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("wanderlust").unwrap();

        assert!(hasher.verify("wanderlust", &hash));
        assert!(!hasher.verify("wrong-password", &hash));
        assert!(!hasher.verify("wanderlust", "not-a-phc-string"));
    }
}
