use std::env;
use std::time::Duration;

use chrono_tz::Tz;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub page_size: usize,
    pub request_timeout: Option<Duration>,
    pub api_token: Option<String>,
    pub display_timezone: Tz,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let api_base_url =
            env::var("NOTIFICATIONS_API_URL").map_err(|_| ConfigError::MissingApiUrl)?;
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(api_base_url));
        }

        let page_size = match env::var("NOTIFICATIONS_PAGE_SIZE") {
            Ok(raw) => match raw.parse::<usize>() {
                Ok(size) if size >= 1 => size,
                _ => return Err(ConfigError::InvalidPageSize(raw)),
            },
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        let request_timeout = match env::var("NOTIFICATIONS_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs >= 1 => Some(Duration::from_secs(secs)),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            Err(_) => None,
        };

        let api_token = env::var("NOTIFICATIONS_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let display_timezone = match env::var("DISPLAY_TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone(name.clone()))?,
            Err(_) => Tz::UTC,
        };

        Ok(Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            page_size,
            request_timeout,
            api_token,
            display_timezone,
        })
    }

    /// Config with defaults for everything except the backend address
    pub fn default_for(api_base_url: impl Into<String>) -> Self {
        let api_base_url: String = api_base_url.into();
        Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: None,
            api_token: None,
            display_timezone: Tz::UTC,
        }
    }

    pub fn notifications_url(&self) -> String {
        format!("{}/notifications", self.api_base_url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("NOTIFICATIONS_API_URL environment variable not set")]
    MissingApiUrl,

    #[error("NOTIFICATIONS_API_URL must start with http:// or https://, got {0}")]
    InvalidApiUrl(String),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(String),

    #[error("Invalid request timeout: {0}")]
    InvalidTimeout(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for_trims_trailing_slash() {
        let config = Config::default_for("http://localhost:8000/api/");
        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(
            config.notifications_url(),
            "http://localhost:8000/api/notifications"
        );
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.request_timeout.is_none());
        assert_eq!(config.display_timezone, Tz::UTC);
    }

    const VARS: [&str; 5] = [
        "NOTIFICATIONS_API_URL",
        "NOTIFICATIONS_PAGE_SIZE",
        "NOTIFICATIONS_REQUEST_TIMEOUT_SECS",
        "NOTIFICATIONS_API_TOKEN",
        "DISPLAY_TIMEZONE",
    ];

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    // Environment variables are process-wide, so every case runs in one test
    #[test]
    fn test_from_env() {
        clear_vars();
        assert!(matches!(Config::from_env(), Err(ConfigError::MissingApiUrl)));

        env::set_var("NOTIFICATIONS_API_URL", "ftp://portal.example.edu");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidApiUrl(_))
        ));

        env::set_var("NOTIFICATIONS_API_URL", "https://portal.example.edu/api/");
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base_url, "https://portal.example.edu/api");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.request_timeout.is_none());
        assert!(config.api_token.is_none());
        assert_eq!(config.display_timezone, Tz::UTC);

        env::set_var("NOTIFICATIONS_PAGE_SIZE", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidPageSize(raw)) if raw == "0"
        ));
        env::set_var("NOTIFICATIONS_PAGE_SIZE", "many");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidPageSize(_))
        ));
        env::set_var("NOTIFICATIONS_PAGE_SIZE", "5");
        assert_eq!(Config::from_env().unwrap().page_size, 5);

        env::set_var("NOTIFICATIONS_REQUEST_TIMEOUT_SECS", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidTimeout(raw)) if raw == "0"
        ));
        env::set_var("NOTIFICATIONS_REQUEST_TIMEOUT_SECS", "15");
        assert_eq!(
            Config::from_env().unwrap().request_timeout,
            Some(Duration::from_secs(15))
        );

        env::set_var("DISPLAY_TIMEZONE", "Mars/Olympus_Mons");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidTimezone(_))
        ));
        env::set_var("DISPLAY_TIMEZONE", "Asia/Ho_Chi_Minh");
        env::set_var("NOTIFICATIONS_API_TOKEN", "  ");
        let config = Config::from_env().unwrap();
        assert_eq!(config.display_timezone, chrono_tz::Asia::Ho_Chi_Minh);
        assert!(config.api_token.is_none());

        clear_vars();
    }
}
