use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::retry::RetryPolicy;

/// Universes tracked when `UNIVERSE_IDS` is not set.
pub const DEFAULT_UNIVERSE_IDS: [&str; 4] =
    ["9535197929", "7314795657", "9061511409", "9551746424"];
pub const DEFAULT_CACHE_KEY: &str = "games_cache_v1";
pub const DEFAULT_INVITE_TEXT: &str =
    "Come play with us on Roblox! https://www.roblox.com/discover#/";
pub const BUILD_TAG: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upstream {
    Direct,
    /// Same-origin style base such as `http://localhost:8787/api/roblox`.
    /// Requests go to `{base}/games` and `{base}/icons`.
    Proxy { base: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBust {
    Timestamp,
    Build,
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub universe_ids: Vec<String>,
    pub upstream: Upstream,
    pub resilient: bool,
    pub static_fallback: bool,
    pub build_tag: String,
    pub cache_bust: CacheBust,
    pub retry: RetryPolicy,
    pub cache_dir: Option<PathBuf>,
    pub cache_key: String,
}

impl LoaderConfig {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            universe_ids: ids.into_iter().map(Into::into).collect(),
            upstream: Upstream::Direct,
            resilient: false,
            static_fallback: false,
            build_tag: BUILD_TAG.to_string(),
            cache_bust: CacheBust::Timestamp,
            retry: RetryPolicy::default(),
            cache_dir: None,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
        }
    }

    pub fn with_proxy(mut self, base: impl Into<String>) -> Self {
        self.upstream = Upstream::Proxy { base: base.into() };
        self
    }

    pub fn resilient(mut self, retry: RetryPolicy) -> Self {
        self.resilient = true;
        self.retry = retry;
        self
    }

    pub fn with_static_fallback(mut self) -> Self {
        self.static_fallback = true;
        self
    }

    pub fn with_build_tag(mut self, tag: impl Into<String>) -> Self {
        self.build_tag = tag.into();
        self
    }

    /// Policy actually applied to each request: the plain modes never retry.
    pub fn effective_retry(&self) -> RetryPolicy {
        if self.resilient {
            self.retry.clone()
        } else {
            RetryPolicy {
                max_attempts: 1,
                ..self.retry.clone()
            }
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ids: Vec<String> = lookup("UNIVERSE_IDS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<String>>()
            })
            .filter(|ids: &Vec<String>| !ids.is_empty())
            .unwrap_or_else(|| DEFAULT_UNIVERSE_IDS.iter().map(|id| id.to_string()).collect());

        let mut config = LoaderConfig::new(ids);

        if let Some(base) = lookup("PROXY_BASE").and_then(|v| non_empty(&v)) {
            Url::parse(&base).with_context(|| format!("invalid PROXY_BASE: {base}"))?;
            config.upstream = Upstream::Proxy {
                base: base.trim_end_matches('/').to_string(),
            };
        }

        config.resilient = lookup("RESILIENT").map(|v| parse_flag(&v)).unwrap_or(false);
        config.static_fallback = lookup("STATIC_FALLBACK")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        if let Some(tag) = lookup("BUILD_TAG").and_then(|v| non_empty(&v)) {
            config.build_tag = tag;
        }
        config.cache_bust = match lookup("CACHE_BUST").map(|v| v.trim().to_lowercase()) {
            Some(mode) if mode == "build" => CacheBust::Build,
            _ => CacheBust::Timestamp,
        };

        let timeout_ms = lookup("FETCH_TIMEOUT_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(8_000)
            .clamp(500, 60_000);
        let max_attempts = lookup("FETCH_MAX_ATTEMPTS")
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(3)
            .clamp(1, 8);
        let backoff_ms = lookup("FETCH_BACKOFF_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(400)
            .min(10_000);
        config.retry = RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(backoff_ms),
            timeout: Duration::from_millis(timeout_ms),
            ..RetryPolicy::default()
        };

        config.cache_dir = lookup("CAROUSEL_CACHE_DIR")
            .and_then(|v| non_empty(&v))
            .map(PathBuf::from);
        if let Some(key) = lookup("CACHE_KEY").and_then(|v| non_empty(&v)) {
            config.cache_key = key;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub refresh_interval: Duration,
    pub invite_text: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let loader = LoaderConfig::from_lookup(&lookup)?;
        let refresh_secs = lookup("REFRESH_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(60)
            .max(15);
        let invite_text = lookup("INVITE_TEXT")
            .and_then(|v| non_empty(&v))
            .unwrap_or_else(|| DEFAULT_INVITE_TEXT.to_string());
        Ok(Self {
            loader,
            refresh_interval: Duration::from_secs(refresh_secs),
            invite_text,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
