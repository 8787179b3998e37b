use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Durable table of users keyed by NIM.
///
/// Every mutation bumps the counter published on [UserRepo::changes], which is what
/// [crate::live::live_users] re-queries on.
#[async_trait]
pub trait UserRepo: Sync + Send {
    async fn get_user(&self, nim: &str) -> Result<Option<User>, UserRepoError>;
    /// All users ordered by name, ties broken by NIM.
    async fn get_all_users(&self) -> Result<Vec<User>, UserRepoError>;
    /// Inserts the user, replacing any existing user with the same NIM.
    async fn insert_user(&self, user: User) -> Result<(), UserRepoError>;
    async fn update_user(&self, user: User) -> Result<(), UserRepoError>;
    async fn delete_user(&self, nim: &str) -> Result<(), UserRepoError>;
    fn changes(&self) -> watch::Receiver<u64>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub nim: String,
    pub name: String,
    pub password_hash: String,
}

impl User {
    pub fn new(nim: String, name: String, password_hash: String) -> User {
        User {
            nim,
            name,
            password_hash,
        }
    }
}

#[derive(Error, Debug)]
pub enum UserRepoError {
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
