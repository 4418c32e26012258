use std::{path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

use crate::{grok::GrokConfig, replicate::ReplicateConfig};

pub const GROK_KEY_VAR: &str = "GROK_API_KEY";
pub const REPLICATE_KEY_VAR: &str = "REPLICATE_API_TOKEN";

const DEFAULT_REPLICATE_VERSION: &str = "39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid { var: &'static str, expected: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Grok,
    Replicate,
}

impl ProviderKind {
    pub fn key_var(self) -> &'static str {
        match self {
            ProviderKind::Grok => GROK_KEY_VAR,
            ProviderKind::Replicate => REPLICATE_KEY_VAR,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grok" | "xai" => Ok(ProviderKind::Grok),
            "replicate" => Ok(ProviderKind::Replicate),
            _ => Err(()),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// | Env Var                   | Default                         |
/// |---------------------------|---------------------------------|
/// | `HOST`                    | `0.0.0.0`                       |
/// | `PORT`                    | `3000`                          |
/// | `IMAGE_PROVIDER`          | `grok`                          |
/// | `GROK_API_KEY`            | unset                           |
/// | `GROK_API_BASE`           | `https://api.x.ai/v1`           |
/// | `GROK_IMAGE_MODEL`        | `grok-imagine-image`            |
/// | `REPLICATE_API_TOKEN`     | unset                           |
/// | `REPLICATE_API_BASE`      | `https://api.replicate.com/v1`  |
/// | `REPLICATE_MODEL_VERSION` | stable-diffusion version hash   |
/// | `POLL_INTERVAL_MS`        | `1000`                          |
/// | `POLL_MAX_ATTEMPTS`       | `120`                           |
/// | `UPSTREAM_TIMEOUT_SECS`   | `60`                            |
/// | `MOCKUP_DEADLINE_SECS`    | `300`                           |
/// | `SPA_DIR`                 | `dist/spa`                      |
/// | `ORDERS_API_BASE`         | unset (in-memory orders)        |
/// | `ORDERS_SEED_FILE`        | unset                           |
///
/// A missing API key is not an error here; it surfaces on the first mockup request.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub provider: ProviderKind,
    pub grok_api_key: Option<String>,
    pub grok_base_url: String,
    pub grok_model: String,
    pub replicate_api_key: Option<String>,
    pub replicate_base_url: String,
    pub replicate_version: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub upstream_timeout: Duration,
    pub mockup_deadline: Duration,
    pub spa_dir: PathBuf,
    pub orders_api_base: Option<String>,
    pub orders_seed_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let provider = match get("IMAGE_PROVIDER") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "IMAGE_PROVIDER",
                expected: "one of `grok`, `replicate`",
                value: v.clone(),
            })?,
            None => ProviderKind::Grok,
        };

        Ok(Self {
            host: or("HOST", "0.0.0.0"),
            port: parse(&get, "PORT", 3000)?,
            provider,
            grok_api_key: get(GROK_KEY_VAR),
            grok_base_url: or("GROK_API_BASE", "https://api.x.ai/v1"),
            grok_model: or("GROK_IMAGE_MODEL", "grok-imagine-image"),
            replicate_api_key: get(REPLICATE_KEY_VAR),
            replicate_base_url: or("REPLICATE_API_BASE", "https://api.replicate.com/v1"),
            replicate_version: or("REPLICATE_MODEL_VERSION", DEFAULT_REPLICATE_VERSION),
            poll_interval: Duration::from_millis(parse(&get, "POLL_INTERVAL_MS", 1000)?),
            max_poll_attempts: parse(&get, "POLL_MAX_ATTEMPTS", 120)?,
            upstream_timeout: Duration::from_secs(parse(&get, "UPSTREAM_TIMEOUT_SECS", 60)?),
            mockup_deadline: Duration::from_secs(parse(&get, "MOCKUP_DEADLINE_SECS", 300)?),
            spa_dir: PathBuf::from(or("SPA_DIR", "dist/spa")),
            orders_api_base: get("ORDERS_API_BASE"),
            orders_seed_file: get("ORDERS_SEED_FILE").map(PathBuf::from),
        })
    }

    /// Key for the selected provider, if configured.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            ProviderKind::Grok => self.grok_api_key.as_deref(),
            ProviderKind::Replicate => self.replicate_api_key.as_deref(),
        }
    }

    pub fn grok(&self, api_key: String) -> GrokConfig {
        GrokConfig {
            api_key,
            base_url: self.grok_base_url.clone(),
            model: self.grok_model.clone(),
        }
    }

    pub fn replicate(&self, api_key: String) -> ReplicateConfig {
        ReplicateConfig {
            api_key,
            base_url: self.replicate_base_url.clone(),
            version: self.replicate_version.clone(),
            poll_interval: self.poll_interval,
            max_poll_attempts: self.max_poll_attempts,
        }
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError> {
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            var,
            expected: "a non-negative integer",
            value,
        }),
    }
}
