use crate::auth::password::Argon2Hasher;
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

const DEFAULT_MAX_POOL_SIZE: u32 = 5;
const DEFAULT_GRACE_PERIOD_MS: u64 = 5000;

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordConfig {
    pub mem_cost: Option<u32>,
    pub time_cost: Option<u32>,
}

impl PasswordConfig {
    pub fn hasher(&self) -> Argon2Hasher {
        let defaults = Argon2Hasher::default();
        Argon2Hasher::with_cost(
            self.mem_cost.unwrap_or(defaults.mem_cost),
            self.time_cost.unwrap_or(defaults.time_cost),
        )
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "default_grace_period_ms")]
    pub user_list_grace_period_ms: u64,
    #[serde(default)]
    pub password: PasswordConfig,
}

impl Config {
    pub fn from_file(path: PathBuf) -> Result<Config, anyhow::Error> {
        let config = fs::read_to_string(path).context("Unable to read config file")?;
        Config::from_toml(&config)
    }

    pub fn from_toml(config: &str) -> Result<Config, anyhow::Error> {
        toml::from_str(config).with_context(|| "Unable to parse config")
    }

    pub fn from_env() -> Result<Config, anyhow::Error> {
        let database_url = read_env("DATABASE_URL")?;
        let max_pool_size = match env::var("MAX_POOL_SIZE") {
            Ok(v) => v.parse().context("Unable to parse MAX_POOL_SIZE value")?,
            Err(_) => DEFAULT_MAX_POOL_SIZE,
        };
        let user_list_grace_period_ms = match env::var("USER_LIST_GRACE_PERIOD_MS") {
            Ok(v) => v
                .parse()
                .context("Unable to parse USER_LIST_GRACE_PERIOD_MS value")?,
            Err(_) => DEFAULT_GRACE_PERIOD_MS,
        };

        let config = Config {
            database_url,
            max_pool_size,
            user_list_grace_period_ms,
            password: PasswordConfig::default(),
        };
        Ok(config)
    }

    pub fn user_list_grace_period(&self) -> Duration {
        Duration::from_millis(self.user_list_grace_period_ms)
    }
}

fn read_env(key: &str) -> Result<String, anyhow::Error> {
    env::var(key).with_context(|| format!("Unable to read env var: {}", key))
}

fn default_max_pool_size() -> u32 {
    DEFAULT_MAX_POOL_SIZE
}

fn default_grace_period_ms() -> u64 {
    DEFAULT_GRACE_PERIOD_MS
}
