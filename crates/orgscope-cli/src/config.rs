//! Configuration loading and resolution.
//!
//! Every setting resolves in the same order: explicit flag, then the
//! matching `ORGSCOPE_*` environment variable, then the library default.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use orgscope::fetch::FetchConfig;
use orgscope::ports::FileCacheStore;
use orgscope::ScraperConfig;

pub const ENV_CACHE_DIR: &str = "ORGSCOPE_CACHE_DIR";
pub const ENV_MAX_RETRIES: &str = "ORGSCOPE_MAX_RETRIES";
pub const ENV_BASE_DELAY_MS: &str = "ORGSCOPE_BASE_DELAY_MS";
pub const ENV_TIMEOUT_MS: &str = "ORGSCOPE_TIMEOUT_MS";
pub const ENV_USER_AGENT: &str = "ORGSCOPE_USER_AGENT";

/// Fetch overrides given on the command line.
#[derive(Debug, Default, Clone)]
pub struct FetchOverrides {
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

/// Resolve the cache directory.
pub fn resolve_cache_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }

    if let Ok(env_dir) = std::env::var(ENV_CACHE_DIR) {
        if !env_dir.is_empty() {
            return PathBuf::from(env_dir);
        }
    }

    FileCacheStore::default_dir()
}

/// Resolve the scraper configuration from flags and environment.
pub fn resolve_scraper_config(overrides: &FetchOverrides) -> ScraperConfig {
    let defaults = FetchConfig::default();
    let env = |name: &str| std::env::var(name).ok();

    let fetch = FetchConfig {
        max_retries: pick(
            ENV_MAX_RETRIES,
            overrides.max_retries,
            env(ENV_MAX_RETRIES),
            defaults.max_retries,
        ),
        base_delay: Duration::from_millis(pick(
            ENV_BASE_DELAY_MS,
            overrides.base_delay_ms,
            env(ENV_BASE_DELAY_MS),
            defaults.base_delay.as_millis() as u64,
        )),
        timeout: Duration::from_millis(pick(
            ENV_TIMEOUT_MS,
            overrides.timeout_ms,
            env(ENV_TIMEOUT_MS),
            defaults.timeout.as_millis() as u64,
        )),
        user_agent: overrides
            .user_agent
            .clone()
            .or_else(|| env(ENV_USER_AGENT).filter(|v| !v.is_empty()))
            .unwrap_or(defaults.user_agent),
    };

    ScraperConfig {
        fetch,
        ..ScraperConfig::default()
    }
}

/// Flag, then parsed environment value, then default. Unparsable
/// environment values are ignored with a warning.
fn pick<T: FromStr>(name: &str, explicit: Option<T>, env_value: Option<String>, default: T) -> T {
    if let Some(value) = explicit {
        return value;
    }
    match env_value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "ignoring invalid environment value");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_order() {
        assert_eq!(pick("X", Some(3u32), Some("7".into()), 10), 3);
        assert_eq!(pick("X", None, Some(" 7 ".into()), 10u32), 7);
        assert_eq!(pick("X", None, None, 10u32), 10);
        assert_eq!(pick("X", None, Some("lots".into()), 10u32), 10);
    }

    #[test]
    fn test_explicit_overrides_win() {
        let overrides = FetchOverrides {
            max_retries: Some(2),
            base_delay_ms: Some(50),
            timeout_ms: Some(750),
            user_agent: Some("probe/1.0".into()),
        };
        let config = resolve_scraper_config(&overrides);
        assert_eq!(config.fetch.max_retries, 2);
        assert_eq!(config.fetch.base_delay, Duration::from_millis(50));
        assert_eq!(config.fetch.timeout, Duration::from_millis(750));
        assert_eq!(config.fetch.user_agent, "probe/1.0");
        assert_eq!(config.credential_key, "proxy");
    }

    #[test]
    fn test_explicit_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_cache_dir(Some(dir.path().to_path_buf())), dir.path());
    }
}
