use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub pool_max_connections: u32,
    pub notification_webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub audit_retention_days: i64,
    pub move_stage_max_retries: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            database_url: get_env("DATABASE_URL")?,
            pool_max_connections: get_env_parse_or("POOL_MAX_CONNECTIONS", 20)?,
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL").ok(),
            webhook_secret: env::var("WEBHOOK_SECRET").ok(),
            audit_retention_days: get_env_parse_or("AUDIT_RETENTION_DAYS", 90)?,
            move_stage_max_retries: get_env_parse_or("MOVE_STAGE_MAX_RETRIES", 3)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
