use crate::live::notify;
use crate::user_repo::UserRepoError::UserNotFound;
use crate::user_repo::{User, UserRepo, UserRepoError};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

pub struct MemUserRepo {
    users: RwLock<HashMap<String, User>>,
    changes: watch::Sender<u64>,
}

impl MemUserRepo {
    pub fn new() -> MemUserRepo {
        let (changes, _) = watch::channel(0);
        MemUserRepo {
            users: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<HashMap<String, User>>, anyhow::Error> {
        self.users
            .read()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<HashMap<String, User>>, anyhow::Error> {
        self.users
            .write()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }
}

impl Default for MemUserRepo {
    fn default() -> Self {
        MemUserRepo::new()
    }
}

#[async_trait]
impl UserRepo for MemUserRepo {
    async fn get_user(&self, nim: &str) -> Result<Option<User>, UserRepoError> {
        let read_guard = self.read_lock()?;
        Ok(read_guard.get(nim).cloned())
    }

    async fn get_all_users(&self) -> Result<Vec<User>, UserRepoError> {
        let read_guard = self.read_lock()?;

        let mut users: Vec<User> = read_guard.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.nim.cmp(&b.nim)));
        Ok(users)
    }

    async fn insert_user(&self, user: User) -> Result<(), UserRepoError> {
        {
            let mut write_guard = self.write_lock()?;
            write_guard.insert(user.nim.clone(), user);
        }
        notify(&self.changes);
        Ok(())
    }

    async fn update_user(&self, user: User) -> Result<(), UserRepoError> {
        {
            let mut write_guard = self.write_lock()?;
            match write_guard.entry(user.nim.clone()) {
                Entry::Occupied(mut e) => {
                    e.insert(user);
                }
                Entry::Vacant(e) => return Err(UserNotFound(e.into_key())),
            }
        }
        notify(&self.changes);
        Ok(())
    }

    async fn delete_user(&self, nim: &str) -> Result<(), UserRepoError> {
        let removed = self.write_lock()?.remove(nim);
        if removed.is_none() {
            return Err(UserNotFound(nim.to_owned()));
        }
        notify(&self.changes);
        Ok(())
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
