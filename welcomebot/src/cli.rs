use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::booster::Booster;
use crate::config::ConfigKey;
use crate::models::StatusId;
use crate::timeline::Timeline;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Boosts original public posts from a Mastodon hashtag timeline"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub settings: SettingArgs,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll the hashtag forever, sleeping between scans
    Run {
        /// Stop after this many scans instead of running forever
        #[arg(long)]
        max_cycles: Option<u64>,
    },
    /// Run one scan and print the next cursor as JSON, for external schedulers
    Once {
        /// Invocation event, e.g. '{"since_id":"109372418374"}'. Pass '-' to read it from stdin
        #[arg(long)]
        event: Option<String>,
    },
}

/// Command-line overrides for every setting. Anything left unset falls back
/// to the environment.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct SettingArgs {
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,
    #[arg(long, global = true)]
    pub username: Option<String>,
    #[arg(long, global = true)]
    pub password: Option<String>,
    #[arg(long, global = true)]
    pub client_id: Option<String>,
    #[arg(long, global = true)]
    pub client_secret: Option<String>,
    #[arg(long, global = true)]
    pub hashtag: Option<String>,
    /// Log what would be boosted without boosting anything. `--dry-run false`
    /// turns it off even when the environment turns it on
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "true")]
    pub dry_run: Option<bool>,
    #[arg(long, global = true)]
    pub batch_size: Option<String>,
    /// Resume strictly after this status id
    #[arg(long, global = true)]
    pub since_id: Option<String>,
    /// Seconds to sleep between scans in `run` mode
    #[arg(long, global = true)]
    pub poll_interval: Option<String>,
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Per-request timeout in seconds. Requests wait indefinitely by default
    #[arg(long, global = true)]
    pub request_timeout: Option<String>,
}

impl SettingArgs {
    pub fn overrides(&self) -> HashMap<ConfigKey, String> {
        let mut overrides = HashMap::new();
        let pairs = [
            (ConfigKey::ApiBaseUrl, &self.api_base_url),
            (ConfigKey::Username, &self.username),
            (ConfigKey::Password, &self.password),
            (ConfigKey::ClientId, &self.client_id),
            (ConfigKey::ClientSecret, &self.client_secret),
            (ConfigKey::Hashtag, &self.hashtag),
            (ConfigKey::BatchSize, &self.batch_size),
            (ConfigKey::SinceId, &self.since_id),
            (ConfigKey::PollInterval, &self.poll_interval),
            (ConfigKey::LogLevel, &self.log_level),
            (ConfigKey::RequestTimeout, &self.request_timeout),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                overrides.insert(key, value.clone());
            }
        }
        if let Some(dry_run) = self.dry_run {
            overrides.insert(ConfigKey::DryRun, dry_run.to_string());
        }
        overrides
    }
}

/// Input handed to a single-shot invocation by its scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub since_id: Option<StatusId>,
}

impl InvocationEvent {
    /// A blank event means "no cursor".
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).context("invocation event is not valid JSON")
    }

    /// Event from `--event`, reading stdin for `-`.
    pub async fn from_arg(arg: Option<&str>) -> Result<Self> {
        Self::from_arg_or_reader(arg, tokio::io::stdin()).await
    }

    async fn from_arg_or_reader<R: AsyncRead + Unpin>(
        arg: Option<&str>,
        mut input: R,
    ) -> Result<Self> {
        match arg {
            None => Ok(Self::default()),
            Some("-") => {
                let mut raw = String::new();
                input
                    .read_to_string(&mut raw)
                    .await
                    .context("failed to read invocation event from stdin")?;
                Self::parse(&raw)
            }
            Some(raw) => Self::parse(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationOutput {
    pub since_id: Option<StatusId>,
}

/// What a single-shot invocation reports back to its scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum InvocationResult {
    Success { output: InvocationOutput },
    Failure { error: String },
}

impl InvocationResult {
    pub fn failure(err: &anyhow::Error) -> Self {
        InvocationResult::Failure {
            error: format!("{err:#}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success { .. })
    }
}

/// One scan for an external scheduler. The cursor comes from the event, then
/// from configuration, and otherwise starts after the newest existing post.
pub async fn run_once<T: Timeline + ?Sized>(
    booster: &Booster<T>,
    hashtag: &str,
    event: InvocationEvent,
    configured_since: Option<StatusId>,
) -> InvocationResult {
    let outcome = async {
        let supplied = event.since_id.or(configured_since);
        let since_id = booster
            .resolve_cursor(hashtag, supplied)
            .await
            .context("failed to resolve starting cursor")?;
        let next = booster
            .scan(hashtag, since_id.as_ref())
            .await
            .context("scan failed")?;
        Ok::<_, anyhow::Error>(next)
    }
    .await;

    match outcome {
        Ok(since_id) => InvocationResult::Success {
            output: InvocationOutput { since_id },
        },
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "single-shot scan failed");
            InvocationResult::failure(&err)
        }
    }
}

/// Poll forever (or `max_cycles` times), feeding each scan's cursor into the
/// next. Any error ends the loop.
pub async fn run_loop<T: Timeline + ?Sized>(
    booster: &Booster<T>,
    hashtag: &str,
    since_id: Option<StatusId>,
    poll_interval: Duration,
    max_cycles: Option<u64>,
) -> Result<Option<StatusId>> {
    let mut cursor = booster
        .resolve_cursor(hashtag, since_id)
        .await
        .context("failed to resolve starting cursor")?;
    let mut cycle: u64 = 0;

    loop {
        cursor = booster
            .scan(hashtag, cursor.as_ref())
            .await
            .with_context(|| format!("scan of #{hashtag} failed"))?;
        cycle += 1;
        if max_cycles.is_some_and(|max| cycle >= max) {
            tracing::info!(cycles = cycle, cursor = ?cursor, "stopping after requested cycles");
            return Ok(cursor);
        }
        tracing::debug!(seconds = poll_interval.as_secs(), "sleeping");
        tokio::time::sleep(poll_interval).await;
    }
}
