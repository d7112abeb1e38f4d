use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use firebase_client::DEFAULT_AUTH_URL;

/// Application configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    pub firebase_api_key: String,
    pub firebase_database_url: String,
    pub firebase_auth_url: String,
    /// Append `auth=<token>` to recipe reads and writes
    pub send_auth_token: bool,
    pub settle_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .context("FIREBASE_API_KEY must be set")?,
            firebase_database_url: env::var("FIREBASE_DATABASE_URL")
                .context("FIREBASE_DATABASE_URL must be set")?,
            firebase_auth_url: env::var("FIREBASE_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            send_auth_token: parse_bool(
                &env::var("RECIPES_SEND_AUTH_TOKEN").unwrap_or_else(|_| "false".to_string()),
            )
            .context("RECIPES_SEND_AUTH_TOKEN must be true or false")?,
            settle_timeout: Duration::from_secs(
                env::var("SETTLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("SETTLE_TIMEOUT_SECS must be a valid number")?,
            ),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("firebase_database_url", &self.firebase_database_url)
            .field("firebase_auth_url", &self.firebase_auth_url)
            .field("send_auth_token", &self.send_auth_token)
            .field("settle_timeout", &self.settle_timeout)
            .finish_non_exhaustive()
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("not a boolean: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool(" YES ").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(!parse_bool("").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = Config {
            firebase_api_key: "AIza-secret".into(),
            firebase_database_url: "https://sandbox.firebaseio.com".into(),
            firebase_auth_url: DEFAULT_AUTH_URL.into(),
            send_auth_token: false,
            settle_timeout: Duration::from_secs(30),
        };
        assert!(!format!("{:?}", config).contains("AIza-secret"));
    }
}
