use std::env;
use std::str::FromStr;

pub const DEFAULT_REMOTE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: String,
    /// Seconds between reconciler runs; 0 disables the background worker.
    pub sync_interval_secs: u64,
    pub remote_url: String,
    pub remote_limit: usize,
    /// Per-request timeout for the remote endpoint.
    pub remote_timeout_secs: u64,
    pub post_new_quotes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 9103,
            db_path: "./quote_service.db".to_string(),
            sync_interval_secs: 30,
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            remote_limit: 5,
            remote_timeout_secs: 10,
            post_new_quotes: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("QUOTE_SERVICE_PORT", defaults.port),
            db_path: env::var("QUOTE_SERVICE_DB_PATH").unwrap_or(defaults.db_path),
            sync_interval_secs: parse_var("QUOTE_SYNC_INTERVAL", defaults.sync_interval_secs),
            remote_url: env::var("QUOTE_REMOTE_URL").unwrap_or(defaults.remote_url),
            remote_limit: parse_var("QUOTE_REMOTE_LIMIT", defaults.remote_limit),
            remote_timeout_secs: parse_var("QUOTE_REMOTE_TIMEOUT", defaults.remote_timeout_secs)
                .max(1),
            post_new_quotes: parse_flag("QUOTE_REMOTE_POST", defaults.post_new_quotes),
        }
    }
}

fn parse_var<T: FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("{} has invalid value '{}', using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Booleans accept true/false, 1/0, yes/no and on/off in any case.
fn parse_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                log::warn!("{} has invalid value '{}', using {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
