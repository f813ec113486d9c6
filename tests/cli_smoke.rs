//! Behavioural smoke tests for the CLI entrypoints.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn cli_without_arguments_prints_help() {
    let mut cmd = cargo_bin_cmd!("flotilla");
    cmd.assert().failure().stderr(contains("Usage"));
}

#[test]
fn cli_acquires_a_batch_from_the_memory_provider() {
    let mut cmd = cargo_bin_cmd!("flotilla");
    cmd.env("FLOTILLA_PROVIDER", "memory");
    cmd.args(["acquire", "2", "--poll-interval-secs", "1"]);

    cmd.assert()
        .success()
        .stdout(contains("\"batch_id\""))
        .stdout(contains("192.168.2.5"));
}

#[test]
fn cli_lists_an_empty_memory_inventory() {
    let mut cmd = cargo_bin_cmd!("flotilla");
    cmd.env("FLOTILLA_PROVIDER", "memory");
    cmd.arg("list");

    cmd.assert().success().stdout("[]\n");
}

#[test]
fn cli_rejects_malformed_batch_ids() {
    let mut cmd = cargo_bin_cmd!("flotilla");
    cmd.env("FLOTILLA_PROVIDER", "memory");
    cmd.args(["release", "bad"]);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("not a batch identifier"));
}

#[test]
fn cli_rejects_unknown_providers() {
    let mut cmd = cargo_bin_cmd!("flotilla");
    cmd.env("FLOTILLA_PROVIDER", "nope");
    cmd.arg("list");

    cmd.assert()
        .failure()
        .stderr(contains("unknown provider 'nope'"));
}

#[test]
fn reaper_sweeps_the_memory_provider() {
    let mut cmd = cargo_bin_cmd!("flotilla-reaper");
    cmd.env("FLOTILLA_PROVIDER", "memory");
    cmd.args(["--max-age-minutes", "30"]);

    cmd.assert().success().stdout(contains(
        "reaper sweep complete: provider=memory, deleted_servers=0, failed_servers=0",
    ));
}
