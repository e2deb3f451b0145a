use std::collections::HashMap;
use std::env;
use std::time::Duration;

use reqwest::Url;
use tracing::Level;

use crate::booster::{BoosterSettings, DEFAULT_BATCH_SIZE};
use crate::error::ConfigError;
use crate::mastodon::MastodonCredentials;
use crate::models::StatusId;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ApiBaseUrl,
    Username,
    Password,
    ClientId,
    ClientSecret,
    Hashtag,
    DryRun,
    BatchSize,
    SinceId,
    PollInterval,
    LogLevel,
    RequestTimeout,
}

impl ConfigKey {
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::ApiBaseUrl => "api_base_url",
            ConfigKey::Username => "username",
            ConfigKey::Password => "password",
            ConfigKey::ClientId => "client_id",
            ConfigKey::ClientSecret => "client_secret",
            ConfigKey::Hashtag => "hashtag",
            ConfigKey::DryRun => "dry_run",
            ConfigKey::BatchSize => "batch_size",
            ConfigKey::SinceId => "since_id",
            ConfigKey::PollInterval => "poll_interval",
            ConfigKey::LogLevel => "log_level",
            ConfigKey::RequestTimeout => "request_timeout",
        }
    }

    /// Environment variable for the setting. Spelled out per key, never
    /// derived from the setting name.
    pub fn env_var(self) -> &'static str {
        match self {
            ConfigKey::ApiBaseUrl => "WELCOME_BOT_API_BASE_URL",
            ConfigKey::Username => "WELCOME_BOT_USERNAME",
            ConfigKey::Password => "WELCOME_BOT_PASSWORD",
            ConfigKey::ClientId => "WELCOME_BOT_CLIENT_ID",
            ConfigKey::ClientSecret => "WELCOME_BOT_CLIENT_SECRET",
            ConfigKey::Hashtag => "WELCOME_BOT_HASHTAG",
            ConfigKey::DryRun => "WELCOME_BOT_DRY_RUN",
            ConfigKey::BatchSize => "WELCOME_BOT_BATCH_SIZE",
            ConfigKey::SinceId => "WELCOME_BOT_SINCE_ID",
            ConfigKey::PollInterval => "WELCOME_BOT_POLL_INTERVAL",
            ConfigKey::LogLevel => "LOG_LEVEL",
            ConfigKey::RequestTimeout => "WELCOME_BOT_REQUEST_TIMEOUT",
        }
    }
}

/// Somewhere settings can come from.
pub trait ConfigSource {
    fn lookup(&self, key: ConfigKey) -> Option<String>;
}

/// Process environment, through [`ConfigKey::env_var`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn lookup(&self, key: ConfigKey) -> Option<String> {
        env::var(key.env_var()).ok()
    }
}

impl ConfigSource for HashMap<ConfigKey, String> {
    fn lookup(&self, key: ConfigKey) -> Option<String> {
        self.get(&key).cloned()
    }
}

/// `first` wins over `fallback`.
pub struct Layered<A, B> {
    pub first: A,
    pub fallback: B,
}

impl<A: ConfigSource, B: ConfigSource> ConfigSource for Layered<A, B> {
    fn lookup(&self, key: ConfigKey) -> Option<String> {
        self.first
            .lookup(key)
            .or_else(|| self.fallback.lookup(key))
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub credentials: MastodonCredentials,
    pub hashtag: String,
    pub dry_run: bool,
    pub batch_size: u32,
    pub since_id: Option<StatusId>,
    pub poll_interval: Duration,
    pub log_level: Level,
    pub request_timeout: Option<Duration>,
}

impl BotConfig {
    pub fn load(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let reader = Reader { source };

        let api_base_url = sanitize_base_url(&reader.required(ConfigKey::ApiBaseUrl)?)?;
        let credentials = MastodonCredentials {
            api_base_url,
            username: reader.required(ConfigKey::Username)?,
            password: reader.required(ConfigKey::Password)?,
            client_id: reader.required(ConfigKey::ClientId)?,
            client_secret: reader.required(ConfigKey::ClientSecret)?,
        };
        let hashtag = reader.required(ConfigKey::Hashtag)?;
        let hashtag = hashtag.trim_start_matches('#').to_string();
        if hashtag.is_empty() {
            return Err(ConfigError::Invalid {
                key: ConfigKey::Hashtag.name(),
                value: "#".into(),
                reason: "hashtag is empty".into(),
            });
        }

        let dry_run = reader.flag(ConfigKey::DryRun)?.unwrap_or(false);
        let batch_size = match reader.positive(ConfigKey::BatchSize)? {
            Some(size) => u32::try_from(size).map_err(|_| ConfigError::Invalid {
                key: ConfigKey::BatchSize.name(),
                value: size.to_string(),
                reason: "too large".into(),
            })?,
            None => DEFAULT_BATCH_SIZE,
        };
        let since_id = reader.optional(ConfigKey::SinceId).map(StatusId::from);
        let poll_interval = Duration::from_secs(
            reader
                .positive(ConfigKey::PollInterval)?
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        );
        let log_level = match reader.optional(ConfigKey::LogLevel) {
            Some(raw) => parse_log_level(&raw)?,
            None => Level::INFO,
        };
        let request_timeout = reader
            .positive(ConfigKey::RequestTimeout)?
            .map(Duration::from_secs);

        Ok(Self {
            credentials,
            hashtag,
            dry_run,
            batch_size,
            since_id,
            poll_interval,
            log_level,
            request_timeout,
        })
    }

    pub fn booster_settings(&self) -> BoosterSettings {
        BoosterSettings {
            batch_size: self.batch_size,
            dry_run: self.dry_run,
        }
    }
}

struct Reader<'a, S> {
    source: &'a S,
}

impl<S: ConfigSource> Reader<'_, S> {
    /// Trimmed value, with blank treated as unset.
    fn optional(&self, key: ConfigKey) -> Option<String> {
        self.source
            .lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    }

    fn required(&self, key: ConfigKey) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing {
            key: key.name(),
            env: key.env_var(),
        })
    }

    fn flag(&self, key: ConfigKey) -> Result<Option<bool>, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid {
                key: key.name(),
                value: raw,
                reason: "expected true or false".into(),
            }),
        }
    }

    fn positive(&self, key: ConfigKey) -> Result<Option<u64>, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(None);
        };
        let value: i64 = raw.parse().map_err(|_| ConfigError::Invalid {
            key: key.name(),
            value: raw.clone(),
            reason: "not an integer".into(),
        })?;
        if value <= 0 {
            return Err(ConfigError::NonPositive { key: key.name() });
        }
        Ok(Some(value as u64))
    }
}

/// Accepts `trace`, `debug`, `info`, `warn` and `error` in any case.
pub fn parse_log_level(raw: &str) -> Result<Level, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(ConfigError::Invalid {
            key: ConfigKey::LogLevel.name(),
            value: raw.to_string(),
            reason: "expected one of trace, debug, info, warn, error".into(),
        }),
    }
}

/// Instance URL with a scheme and no trailing slash. Bare hosts get https.
pub fn sanitize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut base = raw.trim().to_string();
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("https://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    let invalid = |reason: String| ConfigError::Invalid {
        key: ConfigKey::ApiBaseUrl.name(),
        value: raw.to_string(),
        reason,
    };
    let url = Url::parse(&base).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("not a usable base URL".into()));
    }
    Ok(url)
}
