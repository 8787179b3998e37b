mod user_repo;

pub use crate::sqlx_repo::user_repo::SQLxUserRepo;
use crate::user_repo::UserRepo;
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

pub async fn create_repos(
    database_url: &str,
    max_pool_size: u32,
) -> Result<Arc<dyn UserRepo>, anyhow::Error> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database url {}", database_url))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_pool_size)
        .connect_with(options)
        .await
        .context("Unable to open database")?;

    let user_repo = SQLxUserRepo::new(pool);
    user_repo.create_schema().await?;
    Ok(Arc::new(user_repo))
}
