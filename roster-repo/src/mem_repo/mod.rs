use crate::user_repo::UserRepo;
use std::sync::Arc;

mod user_repo;

pub use user_repo::MemUserRepo;

pub fn create_repos() -> Arc<dyn UserRepo> {
    Arc::new(MemUserRepo::new())
}
