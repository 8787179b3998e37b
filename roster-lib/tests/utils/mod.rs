use fake::faker::name::en::Name;
use fake::Fake;
use roster_lib::auth::password::{Argon2Hasher, PasswordHasher};
use roster_lib::repository::{StoreUserRepository, UserRepository};
use roster_lib::share::Subscription;
use roster_lib::user::list::UserListUiState;
use roster_repo::user_repo::UserRepo;
use rstest::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing::Level;
use uuid::Uuid;

pub mod mock;

#[allow(dead_code)]
pub const WAIT: Duration = Duration::from_secs(5);

#[fixture]
#[once]
pub fn tracing_setup() -> () {
    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(Level::DEBUG)
        .init();
    info!("tracing initialized");
}

#[fixture]
pub fn store() -> Arc<dyn UserRepo> {
    roster_repo::mem_repo::create_repos()
}

#[fixture]
pub fn hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(Argon2Hasher::with_cost(1024, 1))
}

pub fn repository(store: Arc<dyn UserRepo>) -> Arc<dyn UserRepository> {
    Arc::new(StoreUserRepository::new(store))
}

#[allow(dead_code)]
pub fn test_nim() -> String {
    "test-user-".to_owned() + &Uuid::new_v4().to_string()
}

#[allow(dead_code)]
pub fn test_name() -> String {
    Name().fake()
}

#[allow(dead_code)]
pub async fn wait_for_users(
    subscription: &mut Subscription<UserListUiState>,
    f: impl FnMut(&UserListUiState) -> bool,
) -> UserListUiState {
    tokio::time::timeout(WAIT, subscription.wait_for(f))
        .await
        .expect("timed out waiting for user list")
        .unwrap()
}
