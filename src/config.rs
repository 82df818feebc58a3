// src/config.rs
//! Strategy list and upstream target, loaded from TOML or built-in defaults.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::strategy::{Envelope, HeaderMode};

pub const ENV_CONFIG_PATH: &str = "GT_STATUS_CONFIG_PATH";
pub const ENV_TARGET_URL: &str = "GT_STATUS_TARGET_URL";
pub const DEFAULT_CONFIG_PATH: &str = "config/status.toml";

pub const DEFAULT_TARGET_URL: &str = "https://growtopiagame.com/detail";
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

fn default_target_url() -> String {
    DEFAULT_TARGET_URL.to_string()
}
fn default_cache_max_age_secs() -> u64 {
    DEFAULT_CACHE_MAX_AGE_SECS
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StrategyDescriptor {
    pub name: String,
    /// URL template; `{target}` and `{target_encoded}` are substituted.
    pub url: String,
    #[serde(default)]
    pub headers: HeaderMode,
    #[serde(default)]
    pub envelope: Envelope,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl StrategyDescriptor {
    fn new(name: &str, url: &str, headers: HeaderMode, envelope: Envelope, timeout_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            headers,
            envelope,
            timeout_ms,
        }
    }
}

/// Priority order: direct first, then relays.
pub fn default_strategies() -> Vec<StrategyDescriptor> {
    vec![
        StrategyDescriptor::new("direct", "{target}", HeaderMode::Rotating, Envelope::None, 5_000),
        StrategyDescriptor::new(
            "allorigins",
            "https://api.allorigins.win/get?url={target_encoded}",
            HeaderMode::Static,
            Envelope::Contents,
            DEFAULT_TIMEOUT_MS,
        ),
        StrategyDescriptor::new(
            "allorigins-raw",
            "https://api.allorigins.win/raw?url={target_encoded}",
            HeaderMode::Static,
            Envelope::None,
            DEFAULT_TIMEOUT_MS,
        ),
        StrategyDescriptor::new(
            "corsproxy",
            "https://corsproxy.io/?url={target_encoded}",
            HeaderMode::Rotating,
            Envelope::None,
            DEFAULT_TIMEOUT_MS,
        ),
        StrategyDescriptor::new(
            "codetabs",
            "https://api.codetabs.com/v1/proxy?quest={target_encoded}",
            HeaderMode::Rotating,
            Envelope::None,
            DEFAULT_TIMEOUT_MS,
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_target_url")]
    pub target_url: String,
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
    #[serde(rename = "strategy", default = "default_strategies")]
    pub strategies: Vec<StrategyDescriptor>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            cache_max_age_secs: default_cache_max_age_secs(),
            strategies: default_strategies(),
        }
    }
}

impl StatusConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_url.trim().is_empty() {
            bail!("target_url is empty");
        }
        if self.strategies.is_empty() {
            bail!("at least one [[strategy]] is required");
        }
        let mut seen = HashSet::new();
        for s in &self.strategies {
            let name = s.name.trim();
            if name.is_empty() {
                bail!("strategy with empty name");
            }
            if !seen.insert(name) {
                bail!("duplicate strategy name: {name}");
            }
            if s.timeout_ms == 0 {
                bail!("strategy {name}: timeout_ms must be > 0");
            }
            if s.url.trim().is_empty() {
                bail!("strategy {name}: url is empty");
            }
        }
        Ok(())
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Parse and validate a TOML document.
pub fn parse(s: &str) -> Result<StatusConfig> {
    let cfg: StatusConfig = toml::from_str(s).context("parsing status config toml")?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from(path: &Path) -> Result<StatusConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading status config from {}", path.display()))?;
    parse(&content).with_context(|| format!("in {}", path.display()))
}

/// Resolution order:
/// 1) $GT_STATUS_CONFIG_PATH (must exist)
/// 2) config/status.toml
/// 3) built-in defaults
///
/// $GT_STATUS_TARGET_URL overrides the target afterwards.
pub fn load_default() -> Result<StatusConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_from(&pb)?
    } else {
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            load_from(&default_p)?
        } else {
            StatusConfig::default()
        }
    };

    if let Ok(target) = std::env::var(ENV_TARGET_URL) {
        let target = target.trim();
        if !target.is_empty() {
            cfg.target_url = target.to_string();
        }
    }

    cfg.validate()?;
    Ok(cfg)
}
