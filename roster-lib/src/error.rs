use crate::auth::password::PasswordError;
use roster_repo::user_repo::UserRepoError;
use thiserror::Error;

/// Failure of a flow's store or hashing step. Flows log it and show a generic message instead
/// of passing it on.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Repo(#[from] UserRepoError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}
