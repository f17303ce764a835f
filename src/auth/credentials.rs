use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use super::password::{hash_password, verify_password};

/// Who a verified login belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub username: String,
    pub role: String,
}

/// Username/password lookup used by the login endpoint
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `None` for an unknown user and for a wrong password alike
    async fn verify(&self, username: &str, password: &str) -> Option<Identity>;
}

struct Account {
    password_hash: String,
    role: String,
}

/// In-memory accounts with argon2id password hashes
pub struct StaticCredentialStore {
    accounts: HashMap<String, Account>,
    // Checked for unknown usernames so both failure paths cost one hash verification
    decoy_hash: String,
}

impl StaticCredentialStore {
    pub fn new() -> Result<Self, argon2::password_hash::Error> {
        Ok(Self { accounts: HashMap::new(), decoy_hash: hash_password("decoy-password")? })
    }

    pub fn with_default_accounts() -> Result<Self, argon2::password_hash::Error> {
        let mut store = Self::new()?;
        store.add_account("admin", "adminpassword", "admin")?;
        store.add_account("user_1", "userpassword", "user")?;
        Ok(store)
    }

    pub fn add_account(&mut self, username: &str, password: &str, role: &str) -> Result<(), argon2::password_hash::Error> {
        let account = Account { password_hash: hash_password(password)?, role: role.to_string() };
        self.accounts.insert(username.to_string(), account);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn verify(&self, username: &str, password: &str) -> Option<Identity> {
        let account = self.accounts.get(username);
        let hash = account.map_or_else(|| self.decoy_hash.clone(), |a| a.password_hash.clone());
        let password = password.to_string();

        // Argon2 is CPU-bound; keep it off the async workers
        let outcome = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await;

        match (outcome, account) {
            (Ok(Ok(true)), Some(account)) => Some(Identity { username: username.to_string(), role: account.role.clone() }),
            (Ok(Ok(_)), _) => None,
            (Ok(Err(e)), _) => {
                tracing::error!("Stored password hash for '{}' is unreadable: {}", username, e);
                None
            }
            (Err(e), _) => {
                tracing::error!("Password verification task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn default_accounts_verify() {
        let store = StaticCredentialStore::with_default_accounts().unwrap();

        let admin = store.verify("admin", "adminpassword").await.unwrap();
        assert_eq!(admin.role, "admin");

        let user = store.verify("user_1", "userpassword").await.unwrap();
        assert_eq!(user.role, "user");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn verification_leaves_the_runtime_free() {
        let store = Arc::new(StaticCredentialStore::with_default_accounts().unwrap());
        let login = tokio::spawn({
            let store = store.clone();
            async move { store.verify("admin", "adminpassword").await }
        });

        // On a single-threaded runtime an inline hash would finish the login before control returns here
        tokio::task::yield_now().await;
        assert!(!login.is_finished());

        assert_eq!(login.await.unwrap().map(|i| i.role), Some("admin".to_string()));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let store = StaticCredentialStore::with_default_accounts().unwrap();
        assert_eq!(store.verify("admin", "userpassword").await, None);
        assert_eq!(store.verify("nobody", "adminpassword").await, None);
    }
}
