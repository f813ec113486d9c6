//! Binary entry point for the flotilla CLI.

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;

use flotilla::{
    AcquireOptions, BatchId, FleetError, InstanceOverrides, NamingError, Provider,
    ProviderBackendError, ProviderError, Settings, telemetry,
};

mod cli;

use cli::{AcquireCommand, Cli};

/// Exit status when a release finished but some deletions failed.
const PARTIAL_FAILURE_EXIT: i32 = 2;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Fleet(#[from] FleetError<ProviderBackendError>),
    #[error("invalid batch id: {0}")]
    BatchId(#[from] NamingError),
    #[error("failed to write output: {0}")]
    Output(String),
}

#[tokio::main]
async fn main() {
    if let Err(err) = telemetry::init() {
        writeln!(io::stderr(), "{err}").ok();
    }

    let cli = Cli::parse();
    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    let settings =
        Settings::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let provider = Provider::from_settings(&settings)?;
    dispatch(&provider, &settings, cli).await
}

async fn dispatch(provider: &Provider, settings: &Settings, cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Acquire(command) => {
            let count = command.count;
            let options = acquire_options(settings, command);
            let batch = provider.acquire(count, &options).await?;
            emit(io::stdout(), &batch)?;
            Ok(0)
        }
        Cli::List(command) => {
            let batch_id = command.batch_id.as_deref().map(BatchId::parse).transpose()?;
            let servers = provider.list(batch_id.as_ref()).await?;
            emit(io::stdout(), &servers)?;
            Ok(0)
        }
        Cli::Release(command) => {
            let batch_id = BatchId::parse(&command.batch_id)?;
            let report = provider.release(&batch_id).await?;
            emit(io::stdout(), &report)?;
            Ok(exit_code_for(report.errors))
        }
        Cli::ReleaseOlderThan(command) => {
            let max_age = Duration::from_secs(command.minutes.saturating_mul(60));
            let report = provider.release_older_than(max_age).await?;
            emit(io::stdout(), &report)?;
            Ok(exit_code_for(report.errors))
        }
    }
}

/// Merges command-line flags over the configured acquire defaults.
fn acquire_options(settings: &Settings, command: AcquireCommand) -> AcquireOptions {
    let mut options = settings.fleet.acquire_options();
    if let Some(secs) = command.timeout_secs {
        options = options.with_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = command.poll_interval_secs {
        options = options.with_poll_interval(Duration::from_secs(secs));
    }
    if let Some(name) = command.name {
        options = options.with_name(name);
    }
    options.with_overrides(InstanceOverrides {
        image: command.image,
        region: command.region,
        size: command.size,
        tags: command.tags,
        ..InstanceOverrides::default()
    })
}

const fn exit_code_for(errors: usize) -> i32 {
    if errors == 0 { 0 } else { PARTIAL_FAILURE_EXIT }
}

fn emit(mut target: impl Write, value: &impl Serialize) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut target, value)
        .map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(target).map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
