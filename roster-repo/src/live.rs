use crate::user_repo::{User, UserRepo, UserRepoError};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;

pub type UserStream = BoxStream<'static, Result<Vec<User>, UserRepoError>>;

/// Streams the ordered list of all users: once immediately, then again after every change to
/// the store. Changes that land while a query is running trigger one more query, so the last
/// item always reflects the latest state.
pub fn live_users(repo: Arc<dyn UserRepo>) -> UserStream {
    let changes = repo.changes();
    stream::unfold(
        (repo, changes, true),
        |(repo, mut changes, first)| async move {
            if first {
                changes.borrow_and_update();
            } else if changes.changed().await.is_err() {
                return None;
            }
            let users = repo.get_all_users().await;
            Some((users, (repo, changes, false)))
        },
    )
    .boxed()
}

pub(crate) fn notify(changes: &watch::Sender<u64>) {
    changes.send_modify(|version| *version = version.wrapping_add(1));
}
