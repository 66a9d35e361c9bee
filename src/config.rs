use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub app_base_url: Url,
    pub session_secure: bool,
    pub session_ttl_hours: i64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials for the admin account created on first start.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let app_base_url = get_env("APP_BASE_URL")?;
        let app_base_url = Url::parse(&app_base_url)
            .map_err(|e| Error::Config(format!("Invalid value for APP_BASE_URL: {}", e)))?;

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin {
                    name: env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                    email,
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            app_base_url,
            session_secure: get_env_parse_or("SESSION_SECURE", false)?,
            session_ttl_hours: get_env_parse_or("SESSION_TTL_HOURS", 8)?,
            bootstrap_admin,
        })
    }

    /// Absolute link a user follows to choose a new password.
    pub fn reset_link(&self, token: &str) -> String {
        match self.app_base_url.join(&format!("auth/reset/{}", token)) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}/auth/reset/{}",
                self.app_base_url.as_str().trim_end_matches('/'),
                token
            ),
        }
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
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
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
