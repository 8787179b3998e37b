use fake::faker::name::en::Name;
use fake::Fake;
use roster_repo::user_repo::{User, UserRepo};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
pub enum RepoType {
    SQLx,
    Mem,
}

pub async fn build_repo(repo_type: RepoType) -> Arc<dyn UserRepo> {
    match repo_type {
        RepoType::SQLx => roster_repo::sqlx_repo::create_repos("sqlite::memory:", 1)
            .await
            .unwrap(),
        RepoType::Mem => roster_repo::mem_repo::create_repos(),
    }
}

#[allow(dead_code)]
pub fn test_user() -> User {
    User::new(
        "test-user-".to_owned() + &Uuid::new_v4().to_string(),
        Name().fake(),
        "not a real hash".to_owned(),
    )
}

#[allow(dead_code)]
pub fn named_user(name: &str) -> User {
    User {
        name: name.to_owned(),
        ..test_user()
    }
}
