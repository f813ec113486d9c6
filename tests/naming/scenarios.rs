//! BDD scenarios for membership markers.

use rstest_bdd_macros::scenario;

use super::test_helpers::{NamingContext, naming_context};

#[scenario(
    path = "tests/features/naming.feature",
    name = "Recover the batch from an encoded server name"
)]
fn scenario_name_round_trip(naming_context: NamingContext) {
    let _ = naming_context;
}

#[scenario(
    path = "tests/features/naming.feature",
    name = "Leave unmarked server names alone"
)]
fn scenario_unmarked_name(naming_context: NamingContext) {
    let _ = naming_context;
}

#[scenario(
    path = "tests/features/naming.feature",
    name = "Recover the batch from a tag set"
)]
fn scenario_tag_round_trip(naming_context: NamingContext) {
    let _ = naming_context;
}

#[scenario(
    path = "tests/features/naming.feature",
    name = "Ignore tag sets without the auto-created marker"
)]
fn scenario_tags_without_marker(naming_context: NamingContext) {
    let _ = naming_context;
}

#[scenario(
    path = "tests/features/naming.feature",
    name = "Reject malformed batch identifiers"
)]
fn scenario_malformed_batch_id(naming_context: NamingContext) {
    let _ = naming_context;
}
