use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use welcomebot::cli::{self, Args, Command, InvocationEvent, InvocationResult};
use welcomebot::config::{BotConfig, EnvSource, Layered};
use welcomebot::{telemetry, Booster, BotError, MastodonClient};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.clone().unwrap_or(Command::Run { max_cycles: None });

    let loaded = BotConfig::load(&Layered {
        first: args.settings.overrides(),
        fallback: EnvSource,
    });

    match command {
        Command::Run { max_cycles } => {
            let config = loaded.context("invalid configuration")?;
            telemetry::init_tracing(config.log_level);
            let booster = connect(&config).await?;
            cli::run_loop(
                &booster,
                &config.hashtag,
                config.since_id.clone(),
                config.poll_interval,
                max_cycles,
            )
            .await?;
            Ok(())
        }
        Command::Once { event } => {
            let result = match loaded.context("invalid configuration") {
                Ok(config) => {
                    telemetry::init_tracing(config.log_level);
                    single_shot(&config, event.as_deref()).await
                }
                Err(err) => {
                    telemetry::init_tracing(tracing::Level::INFO);
                    tracing::error!(error = %format!("{err:#}"), "not starting");
                    InvocationResult::failure(&err)
                }
            };
            println!("{}", serde_json::to_string(&result)?);
            if !result.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn single_shot(config: &BotConfig, event: Option<&str>) -> InvocationResult {
    let event = match InvocationEvent::from_arg(event).await {
        Ok(event) => event,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "unreadable invocation event");
            return InvocationResult::failure(&err);
        }
    };
    let booster = match connect(config).await {
        Ok(booster) => booster,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "could not connect");
            return InvocationResult::failure(&err);
        }
    };
    cli::run_once(&booster, &config.hashtag, event, config.since_id.clone()).await
}

/// Log in once; the session is shared by every scan this process runs.
async fn connect(config: &BotConfig) -> Result<Booster<MastodonClient>> {
    tracing::info!(
        hashtag = %config.hashtag,
        dry_run = config.dry_run,
        batch_size = config.batch_size,
        "welcome bot starting"
    );
    let client = MastodonClient::login(&config.credentials, config.request_timeout)
        .await
        .map_err(BotError::Login)?;
    let booster = Booster::new(Arc::new(client), config.booster_settings())?;
    Ok(booster)
}
