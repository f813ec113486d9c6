//! Command-line interface definitions for the `flotilla` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `flotilla` binary.
#[derive(Debug, Parser)]
#[command(
    name = "flotilla",
    about = "Provision, list, and release batches of disposable cloud servers",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Create a batch of servers and wait until all of them are active.
    #[command(name = "acquire", about = "Create a batch and wait until it is active")]
    Acquire(AcquireCommand),
    /// List managed servers, optionally restricted to one batch.
    #[command(name = "list", about = "List managed servers")]
    List(ListCommand),
    /// Delete every server of one batch.
    #[command(name = "release", about = "Delete every server of a batch")]
    Release(ReleaseCommand),
    /// Delete every managed server older than the given age.
    #[command(
        name = "release-older-than",
        about = "Delete managed servers older than an age in minutes"
    )]
    ReleaseOlderThan(ReleaseOlderThanCommand),
}

/// Arguments for the `flotilla acquire` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct AcquireCommand {
    /// Number of servers in the batch.
    #[arg(value_name = "COUNT")]
    pub(crate) count: usize,
    /// Base server name; members of multi-server batches get `-1`, `-2`, ...
    #[arg(long, value_name = "NAME")]
    pub(crate) name: Option<String>,
    /// Override the image label.
    #[arg(long, value_name = "IMAGE")]
    pub(crate) image: Option<String>,
    /// Override the size (commercial type).
    #[arg(long, value_name = "SIZE")]
    pub(crate) size: Option<String>,
    /// Override the region (availability zone).
    #[arg(long, value_name = "REGION")]
    pub(crate) region: Option<String>,
    /// Extra tag applied to every server; may be repeated.
    #[arg(long = "tag", value_name = "TAG")]
    pub(crate) tags: Vec<String>,
    /// Convergence budget in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) timeout_secs: Option<u64>,
    /// Delay between provider polls in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) poll_interval_secs: Option<u64>,
}

/// Arguments for the `flotilla list` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ListCommand {
    /// Only list servers of this batch.
    #[arg(value_name = "BATCH_ID")]
    pub(crate) batch_id: Option<String>,
}

/// Arguments for the `flotilla release` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ReleaseCommand {
    /// Batch to release.
    #[arg(value_name = "BATCH_ID")]
    pub(crate) batch_id: String,
}

/// Arguments for the `flotilla release-older-than` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ReleaseOlderThanCommand {
    /// Servers created strictly more than this many minutes ago are deleted.
    #[arg(value_name = "MINUTES")]
    pub(crate) minutes: u64,
}
