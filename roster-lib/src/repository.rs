use async_trait::async_trait;
use roster_repo::live::{live_users, UserStream};
use roster_repo::user_repo::{User, UserRepo, UserRepoError};
use std::sync::Arc;

/// What the flows see of user storage.
#[async_trait]
pub trait UserRepository: Sync + Send {
    /// Users ordered by name, re-emitted after every change.
    fn get_all_users(&self) -> UserStream;
    async fn get_user_with_nim(&self, nim: &str) -> Result<Option<User>, UserRepoError>;
    /// Stores the user, replacing any user with the same NIM.
    async fn register(&self, user: User) -> Result<(), UserRepoError>;
    async fn update_user(&self, user: User) -> Result<(), UserRepoError>;
    async fn delete_user(&self, user: &User) -> Result<(), UserRepoError>;
}

pub struct StoreUserRepository {
    store: Arc<dyn UserRepo>,
}

impl StoreUserRepository {
    pub fn new(store: Arc<dyn UserRepo>) -> StoreUserRepository {
        StoreUserRepository { store }
    }
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    fn get_all_users(&self) -> UserStream {
        live_users(self.store.clone())
    }

    async fn get_user_with_nim(&self, nim: &str) -> Result<Option<User>, UserRepoError> {
        self.store.get_user(nim).await
    }

    async fn register(&self, user: User) -> Result<(), UserRepoError> {
        self.store.insert_user(user).await
    }

    async fn update_user(&self, user: User) -> Result<(), UserRepoError> {
        self.store.update_user(user).await
    }

    async fn delete_user(&self, user: &User) -> Result<(), UserRepoError> {
        self.store.delete_user(&user.nim).await
    }
}
