use thiserror::Error;

use crate::models::StatusId;

/// Failures talking to the Mastodon API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("login rejected: {0}")]
    Auth(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {key} (set {env} or pass --{flag})", flag = .key.replace('_', "-"))]
    Missing { key: &'static str, env: &'static str },
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{key} must be a positive integer")]
    NonPositive { key: &'static str },
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to log in")]
    Login(#[source] ClientError),
    #[error("failed to fetch #{hashtag} timeline")]
    Fetch {
        hashtag: String,
        #[source]
        source: ClientError,
    },
    #[error("failed to boost status {id}")]
    Action {
        id: StatusId,
        #[source]
        source: ClientError,
    },
}

pub type Result<T, E = BotError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_setting_names_env_and_flag() {
        let err = ConfigError::Missing {
            key: "api_base_url",
            env: "WELCOME_BOT_API_BASE_URL",
        };
        let message = err.to_string();
        assert!(message.contains("WELCOME_BOT_API_BASE_URL"));
        assert!(message.contains("--api-base-url"));
    }

    #[test]
    fn action_error_keeps_source_chain() {
        let err = BotError::Action {
            id: StatusId::from("42"),
            source: ClientError::Api {
                status: 429,
                body: "rate limited".into(),
            },
        };
        assert_eq!(err.to_string(), "failed to boost status 42");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("server returned 429: rate limited"));
    }
}
