// Environment-driven configuration, loaded once at startup after dotenvy

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_API_KEYS: usize = 10;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;

/// Placeholder values from the setup template; never real keys.
const PLACEHOLDER_KEYS: [&str; 3] = [
    "your_primary_api_key_here",
    "your_secondary_api_key_here",
    "your_tertiary_api_key_here",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub api_keys: Vec<String>,
    pub page_delay: Duration,
    pub enrich_subscribers: bool,
    pub filler_seed: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let max_keys = parse_var(&lookup, "MAX_API_KEYS")?.unwrap_or(DEFAULT_MAX_API_KEYS);
        let page_delay_ms = parse_var(&lookup, "SEARCH_PAGE_DELAY_MS")?.unwrap_or(DEFAULT_PAGE_DELAY_MS);
        let enrich_subscribers = parse_bool(&lookup, "ENRICH_SUBSCRIBERS")?.unwrap_or(true);
        let filler_seed = parse_var(&lookup, "SEARCH_FILLER_SEED")?;

        let api_keys = collect_api_keys(&lookup, max_keys);
        if api_keys.is_empty() {
            return Err(ConfigError::NoCredentials);
        }

        Ok(Self {
            port,
            api_keys,
            page_delay: Duration::from_millis(page_delay_ms),
            enrich_subscribers,
            filler_seed,
        })
    }
}

/// Gather `YOUTUBE_API_KEY_1..=max_keys` in slot order. Slot 1 falls back to
/// the unnumbered `YOUTUBE_API_KEY`. Blank and placeholder values are skipped.
pub fn collect_api_keys<F>(lookup: F, max_keys: usize) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut keys = Vec::new();

    for slot in 1..=max_keys {
        let mut value = lookup(&format!("YOUTUBE_API_KEY_{}", slot));
        if slot == 1 && value.as_deref().map_or(true, |v| v.trim().is_empty()) {
            value = lookup("YOUTUBE_API_KEY");
        }

        let Some(value) = value else { continue };
        let value = value.trim();
        if value.is_empty() || PLACEHOLDER_KEYS.contains(&value) {
            continue;
        }

        tracing::info!("🔑 YOUTUBE_API_KEY_{} loaded", slot);
        keys.push(value.to_string());
    }

    keys
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: name.to_string(),
                value: raw,
            }),
        _ => Ok(None),
    }
}

fn parse_bool<F>(lookup: &F, name: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                var: name.to_string(),
                value: v,
            }),
        },
    }
}
