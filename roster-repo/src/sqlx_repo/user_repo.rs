use crate::live::notify;
use crate::user_repo::{User, UserRepo, UserRepoError};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::{query, query_as, Pool, Sqlite};
use tokio::sync::watch;
use tracing::instrument;

pub struct SQLxUserRepo {
    pool: Pool<Sqlite>,
    changes: watch::Sender<u64>,
}

impl SQLxUserRepo {
    pub fn new(pool: Pool<Sqlite>) -> SQLxUserRepo {
        let (changes, _) = watch::channel(0);
        SQLxUserRepo { pool, changes }
    }

    pub async fn create_schema(&self) -> Result<(), anyhow::Error> {
        query(
            "CREATE TABLE IF NOT EXISTS users (
                nim TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Unable to create users table")?;
        Ok(())
    }
}

#[async_trait]
impl UserRepo for SQLxUserRepo {
    #[instrument(skip(self))]
    async fn get_user(&self, nim: &str) -> Result<Option<User>, UserRepoError> {
        let user = query_as::<_, User>(
            "SELECT nim, name, password_hash FROM users WHERE nim = ? LIMIT 1",
        )
        .bind(nim)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to get user {}", nim))?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_all_users(&self) -> Result<Vec<User>, UserRepoError> {
        let users = query_as::<_, User>(
            "SELECT nim, name, password_hash FROM users ORDER BY name ASC, nim ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Unable to get users")?;
        Ok(users)
    }

    #[instrument(skip(self, user), fields(nim = %user.nim))]
    async fn insert_user(&self, user: User) -> Result<(), UserRepoError> {
        query(
            "INSERT INTO users(nim, name, password_hash) VALUES(?, ?, ?)
            ON CONFLICT(nim) DO UPDATE SET name = excluded.name, password_hash = excluded.password_hash",
        )
        .bind(&user.nim)
        .bind(&user.name)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to insert user {}", user.nim))?;
        notify(&self.changes);
        Ok(())
    }

    #[instrument(skip(self, user), fields(nim = %user.nim))]
    async fn update_user(&self, user: User) -> Result<(), UserRepoError> {
        let result = query("UPDATE users SET name = ?, password_hash = ? WHERE nim = ?")
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(&user.nim)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to update user {}", user.nim))?;
        if result.rows_affected() == 1 {
            notify(&self.changes);
            Ok(())
        } else {
            Err(UserRepoError::UserNotFound(user.nim))
        }
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, nim: &str) -> Result<(), UserRepoError> {
        let result = query("DELETE FROM users WHERE nim = ?")
            .bind(nim)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete user {}", nim))?;
        if result.rows_affected() == 1 {
            notify(&self.changes);
            Ok(())
        } else {
            Err(UserRepoError::UserNotFound(nim.to_owned()))
        }
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
