use anyhow::anyhow;
use async_trait::async_trait;
use roster_repo::user_repo::{User, UserRepo, UserRepoError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

/// Store whose every operation fails, as a broken database would.
#[allow(dead_code)]
pub struct FailingUserRepo {
    changes: watch::Sender<u64>,
}

#[allow(dead_code)]
impl FailingUserRepo {
    pub fn new() -> FailingUserRepo {
        let (changes, _) = watch::channel(0);
        FailingUserRepo { changes }
    }

    fn error() -> UserRepoError {
        UserRepoError::Other(anyhow!("disk I/O error"))
    }
}

#[async_trait]
impl UserRepo for FailingUserRepo {
    async fn get_user(&self, _nim: &str) -> Result<Option<User>, UserRepoError> {
        Err(Self::error())
    }

    async fn get_all_users(&self) -> Result<Vec<User>, UserRepoError> {
        Err(Self::error())
    }

    async fn insert_user(&self, _user: User) -> Result<(), UserRepoError> {
        Err(Self::error())
    }

    async fn update_user(&self, _user: User) -> Result<(), UserRepoError> {
        Err(Self::error())
    }

    async fn delete_user(&self, _nim: &str) -> Result<(), UserRepoError> {
        Err(Self::error())
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

/// Holds every insert until [GatedUserRepo::open] is called.
#[allow(dead_code)]
pub struct GatedUserRepo {
    inner: Arc<dyn UserRepo>,
    gate: Notify,
    inserts: AtomicUsize,
}

#[allow(dead_code)]
impl GatedUserRepo {
    pub fn new(inner: Arc<dyn UserRepo>) -> GatedUserRepo {
        GatedUserRepo {
            inner,
            gate: Notify::new(),
            inserts: AtomicUsize::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.notify_one();
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepo for GatedUserRepo {
    async fn get_user(&self, nim: &str) -> Result<Option<User>, UserRepoError> {
        self.inner.get_user(nim).await
    }

    async fn get_all_users(&self) -> Result<Vec<User>, UserRepoError> {
        self.inner.get_all_users().await
    }

    async fn insert_user(&self, user: User) -> Result<(), UserRepoError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.inner.insert_user(user).await
    }

    async fn update_user(&self, user: User) -> Result<(), UserRepoError> {
        self.inner.update_user(user).await
    }

    async fn delete_user(&self, nim: &str) -> Result<(), UserRepoError> {
        self.inner.delete_user(nim).await
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.inner.changes()
    }
}
