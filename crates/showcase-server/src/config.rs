use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use tracing::info;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("SHOWCASE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SHOWCASE_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let ttl_minutes: i64 = try_load("SHOWCASE_TOKEN_TTL_MINUTES", "60")?;

        Ok(Self {
            jwt_secret,
            db_path: try_load::<String>("SHOWCASE_DB_PATH", "showcase.db")?.into(),
            host: try_load("SHOWCASE_HOST", "0.0.0.0")?,
            port: try_load("SHOWCASE_PORT", "3000")?,
            token_ttl: chrono::Duration::minutes(ttl_minutes),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value '{raw}'"))
}
