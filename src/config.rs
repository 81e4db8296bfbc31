use std::{env, path::PathBuf};

use anyhow::Context;
use tracing::warn;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub pool_size: u32,
    /// Login tokens older than this are rejected.
    pub session_ttl_secs: i64,
    pub media_dir: PathBuf,
}

impl Config {
    /// Reads the environment (after `.env`, if present, has been loaded).
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not found")?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let pool_size = parse_or("DB_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        let session_ttl_secs = parse_or("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let media_dir = env::var("MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./media"));

        if !media_dir.is_dir() {
            warn!(media_dir = %media_dir.display(), "media directory does not exist, logos will 404");
        }

        Ok(Self {
            database_url,
            bind_addr,
            pool_size,
            session_ttl_secs,
            media_dir,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            bind_addr: DEFAULT_BIND.to_string(),
            pool_size: 1,
            session_ttl_secs: 3600,
            media_dir: PathBuf::from("./media"),
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid value: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
