use anyhow::{anyhow, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

pub const DEFAULT_MIRROR_BASE_URL: &str = "https://mainnet-public.mirrornode.hedera.com";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SURFACING_ATTEMPTS: u32 = 10;
pub const DEFAULT_SURFACING_INTERVAL_MS: u64 = 3_000;

/// Runtime configuration.
///
/// Resolution priority: environment variables > defaults. There is no CLI
/// surface; the embedding application decides how the environment is set up.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the mirror-node REST API.
    pub mirror_base_url: String,
    /// Per-request timeout for mirror-node calls, in milliseconds.
    pub request_timeout_ms: u64,
    /// How many times the wallet driver polls for a submitted transaction.
    pub surfacing_attempts: u32,
    /// Spacing between surfacing polls, in milliseconds.
    pub surfacing_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror_base_url: DEFAULT_MIRROR_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            surfacing_attempts: DEFAULT_SURFACING_ATTEMPTS,
            surfacing_interval_ms: DEFAULT_SURFACING_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Builds the configuration from the environment, falling back to
    /// defaults. Malformed numeric values are errors, not silent defaults.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Config::default();

        if let Ok(v) = env::var("MIRROR_BASE_URL") {
            if !v.is_empty() {
                cfg.mirror_base_url = v;
            }
        }
        if let Ok(v) = env::var("MIRROR_TIMEOUT_MS") {
            cfg.request_timeout_ms = parse_env("MIRROR_TIMEOUT_MS", &v)?;
        }
        if let Ok(v) = env::var("SURFACING_ATTEMPTS") {
            cfg.surfacing_attempts = parse_env("SURFACING_ATTEMPTS", &v)?;
        }
        if let Ok(v) = env::var("SURFACING_INTERVAL_MS") {
            cfg.surfacing_interval_ms = parse_env("SURFACING_INTERVAL_MS", &v)?;
        }

        log::info!(
            "[config] mirror={} timeout={}ms surfacing={}x{}ms",
            cfg.mirror_base_url,
            cfg.request_timeout_ms,
            cfg.surfacing_attempts,
            cfg.surfacing_interval_ms
        );
        Ok(cfg)
    }
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| anyhow!("Invalid {name}='{raw}': {e}"))
}
