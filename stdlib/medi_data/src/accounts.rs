//! User accounts: a single table of `(id, name, email, password hash)`.
//!
//! Passwords are stored as lowercase hex SHA-256 digests. Emails are unique.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

use crate::storage_file::{FileStore, StoreError};

const USERS_KEY: &str = "users";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please fill out all fields.")]
    MissingFields,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("This email address is already registered.")]
    EmailTaken,
    #[error("Please enter both email and password.")]
    MissingCredentials,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("An error occurred: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    hex::encode(digest)
}

pub struct AccountStore {
    store: FileStore,
}

impl AccountStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self {
            store: FileStore::new(dir)?,
        })
    }

    fn users(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.store.load(USERS_KEY)?.unwrap_or_default())
    }

    pub fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Account, AuthError> {
        if name.is_empty() || email.is_empty() || password.is_empty() || confirm_password.is_empty()
        {
            return Err(AuthError::MissingFields);
        }
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        let mut users = self.users()?;
        if users.iter().any(|u| u.email == email) {
            return Err(AuthError::EmailTaken);
        }
        let account = Account {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
        };
        users.push(account.clone());
        self.store.save(USERS_KEY, &users)?;
        log::info!("registered account {}", account.id);
        Ok(account)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let hash = hash_password(password);
        self.users()?
            .into_iter()
            .find(|u| u.email == email && u.password_hash == hash)
            .ok_or(AuthError::InvalidCredentials)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.users()?.into_iter().find(|u| u.email == email))
    }
}
