//! Age-based reaper for flotilla-managed servers.
//!
//! The binary performs one `release-older-than` sweep against the configured
//! provider, prints a one-line summary, and exits non-zero when any deletion
//! failed. It is meant to run from cron or a CI cleanup job.

use std::io::Write as _;
use std::time::Duration;

use clap::Parser;
use flotilla::{Provider, Settings, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "flotilla-reaper",
    about = "Delete flotilla-managed servers older than a maximum age"
)]
struct Cli {
    /// Servers created strictly more than this many minutes ago are deleted.
    #[arg(long, env = "FLOTILLA_REAPER_MAX_AGE_MINUTES", default_value_t = 60)]
    max_age_minutes: u64,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    telemetry::init().map_err(|err| err.to_string())?;
    let cli = Cli::parse();

    let settings = Settings::load_without_cli_args().map_err(|err| err.to_string())?;
    let provider = Provider::from_settings(&settings).map_err(|err| err.to_string())?;
    let max_age = Duration::from_secs(cli.max_age_minutes.saturating_mul(60));
    let report = provider
        .release_older_than(max_age)
        .await
        .map_err(|err| err.to_string())?;

    writeln!(
        std::io::stdout(),
        "reaper sweep complete: provider={}, deleted_servers={}, failed_servers={}",
        provider.kind(),
        report.deleted(),
        report.errors
    )
    .map_err(|err| err.to_string())?;

    if report.errors > 0 {
        return Err(format!("{} server(s) could not be released", report.errors));
    }
    Ok(())
}
