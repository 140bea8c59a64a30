use std::time::Duration;

use anyhow::Context;
use time::UtcOffset;

use crate::clock::parse_offset;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Without a database the ratings live in memory and menu/comments are disabled.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Offset used for rating windows, calendar days and the midnight reset.
    pub utc_offset: UtcOffset,
    pub enforce_windows: bool,
    pub reset_retry: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().context("APP_PORT")?,
            Err(_) => 5000,
        };
        let utc_offset = match std::env::var("MENU_UTC_OFFSET") {
            Ok(v) => parse_offset(&v).context("MENU_UTC_OFFSET")?,
            Err(_) => UtcOffset::UTC,
        };
        let enforce_windows = std::env::var("RATING_WINDOWS_ENFORCED")
            .ok()
            .map(|v| parse_flag(&v))
            .unwrap_or(true);
        let reset_retry = std::env::var("RESET_RETRY_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            utc_offset,
            enforce_windows,
            reset_retry,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
