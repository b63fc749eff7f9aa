use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use log::{info, warn};

// ===================================
//         DOMAIN LIMITS
// ===================================

pub const MIN_COOKING_TIME: i32 = 1;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;

pub const TAG_MAX_LENGTH: usize = 32;
pub const INGREDIENT_MAX_LENGTH: usize = 128;
pub const MEASUREMENT_UNIT_MAX_LENGTH: usize = 64;
pub const RECIPE_MAX_LENGTH: usize = 256;

pub const EMAIL_MAX_LENGTH: usize = 254;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 150;

/// Runtime settings, read once at startup and handed to the server state
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub media_root: PathBuf,
    pub page_size: u64,
    pub max_page_size: u64,
    pub public_url: String,
}

impl Config {
    /// Loads `.env` (if any) and reads every value from the environment,
    /// falling back to defaults for the missing ones
    pub fn load() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://foodgram.db?mode=rwc")?,
            host: try_load("FOODGRAM_HOST", "0.0.0.0")?,
            port: try_load("FOODGRAM_PORT", "8000")?,
            media_root: try_load::<String>("FOODGRAM_MEDIA_ROOT", "media")?.into(),
            page_size: try_load("FOODGRAM_PAGE_SIZE", "6")?,
            max_page_size: try_load("FOODGRAM_MAX_PAGE_SIZE", "100")?,
            public_url: try_load::<String>("FOODGRAM_PUBLIC_URL", "http://localhost:8000")?
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            media_root: PathBuf::from("media"),
            page_size: 6,
            max_page_size: 100,
            public_url: "http://localhost:8000".to_string(),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, String>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        format!("invalid value for {key}: {e}")
    })
}
