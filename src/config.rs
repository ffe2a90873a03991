use chrono::Weekday;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::reset::WeeklyWindow;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub bot_token: String,
    pub bot_api_url: String,
    pub bot_timeout: Duration,
    pub game_url: String,
    pub webhook_key: String,
    pub admin_chat_id: Option<String>,
    pub public_url: Option<String>,
    pub reset: ResetConfig,
}

/// Weekly reset schedule
#[derive(Debug, Clone)]
pub struct ResetConfig {
    pub window: WeeklyWindow,
    pub poll_interval: Duration,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            window: WeeklyWindow::new(Weekday::Sun, 0, 5),
            poll_interval: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    /// Configuration with defaults for everything but the three required values
    pub fn new(bot_token: String, game_url: String, webhook_key: String) -> Self {
        Self {
            port: 8080,
            database_url: "sqlite://scores.db".to_string(),
            bot_token,
            bot_api_url: "https://api.telegram.org".to_string(),
            bot_timeout: Duration::from_millis(3000),
            game_url,
            webhook_key,
            admin_chat_id: None,
            public_url: None,
            reset: ResetConfig::default(),
        }
    }

    /// Loads configuration from the environment (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let mut config = Self::new(
            required("BOT_TOKEN")?,
            required("GAME_URL")?,
            required("WEBHOOK_KEY")?,
        );

        if let Some(port) = get("PORT") {
            config.port = parse_var("PORT", &port)?;
        }
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(url) = get("BOT_API_URL") {
            config.bot_api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ms) = get("BOT_TIMEOUT_MS") {
            config.bot_timeout = Duration::from_millis(parse_var("BOT_TIMEOUT_MS", &ms)?);
        }
        config.admin_chat_id = get("ADMIN_CHAT_ID");
        config.public_url = get("PUBLIC_URL").map(|url| url.trim_end_matches('/').to_string());

        let mut window = config.reset.window.clone();
        if let Some(day) = get("RESET_WEEKDAY") {
            window.weekday = Weekday::from_str(&day).map_err(|_| ConfigError::Invalid {
                var: "RESET_WEEKDAY",
                value: day.clone(),
            })?;
        }
        if let Some(hour) = get("RESET_HOUR") {
            window.hour = parse_var("RESET_HOUR", &hour)?;
            if window.hour > 23 {
                return Err(ConfigError::Invalid {
                    var: "RESET_HOUR",
                    value: hour,
                });
            }
        }
        if let Some(minutes) = get("RESET_WINDOW_MINUTES") {
            window.window_minutes = parse_var("RESET_WINDOW_MINUTES", &minutes)?;
            if window.window_minutes == 0 || window.window_minutes > 60 {
                return Err(ConfigError::Invalid {
                    var: "RESET_WINDOW_MINUTES",
                    value: minutes,
                });
            }
        }
        config.reset.window = window;

        if let Some(secs) = get("RESET_POLL_SECS") {
            let secs: u64 = parse_var("RESET_POLL_SECS", &secs)?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "RESET_POLL_SECS",
                    value: "0".to_string(),
                });
            }
            config.reset.poll_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}
