//! BDD step definitions for membership markers.

use flotilla::naming::{AUTO_CREATED_TAG, batch_tags, decode_name, decode_tags, encode_name};
use flotilla::{BatchId, MembershipEncoding};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::NamingContext;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a fresh name-encoded batch")]
fn fresh_name_batch(mut naming_context: NamingContext) -> NamingContext {
    naming_context.batch_id = Some(BatchId::generate(MembershipEncoding::Name));
    naming_context
}

#[given("a fresh tag-encoded batch")]
fn fresh_tag_batch(mut naming_context: NamingContext) -> NamingContext {
    naming_context.batch_id = Some(BatchId::generate(MembershipEncoding::Tags));
    naming_context
}

#[given("the server name \"{name}\"")]
fn given_server_name(mut naming_context: NamingContext, name: String) -> NamingContext {
    naming_context.name = Some(name);
    naming_context
}

#[when("I encode the server name \"{name}\"")]
fn encode_server_name(mut naming_context: NamingContext, name: String) -> NamingContext {
    let batch_id = naming_context.generated_batch();
    naming_context.name = Some(encode_name(&name, &batch_id));
    naming_context
}

fn decode_pending_name(mut naming_context: NamingContext) -> NamingContext {
    let decoded = decode_name(&naming_context.pending_name());
    naming_context.decoded_batch = decoded.batch_id.clone();
    naming_context.decoded = Some(decoded);
    naming_context
}

#[when("I decode the encoded name")]
fn decode_encoded_name(naming_context: NamingContext) -> NamingContext {
    decode_pending_name(naming_context)
}

#[when("I decode the given name")]
fn decode_given_name(naming_context: NamingContext) -> NamingContext {
    decode_pending_name(naming_context)
}

#[when("I decode the batch tags plus \"{extra}\"")]
fn decode_tags_with_extra(mut naming_context: NamingContext, extra: String) -> NamingContext {
    let mut tags = batch_tags(&naming_context.generated_batch());
    tags.push(extra);
    naming_context.decoded_batch = decode_tags(&tags);
    naming_context
}

#[when("I decode the batch tags without the auto-created marker")]
fn decode_tags_without_marker(mut naming_context: NamingContext) -> NamingContext {
    let tags: Vec<String> = batch_tags(&naming_context.generated_batch())
        .into_iter()
        .filter(|tag| tag != AUTO_CREATED_TAG)
        .collect();
    naming_context.decoded_batch = decode_tags(&tags);
    naming_context
}

#[when("I parse the batch identifier \"{value}\"")]
fn parse_batch_identifier(mut naming_context: NamingContext, value: String) -> NamingContext {
    match BatchId::parse(&value) {
        Ok(batch_id) => naming_context.batch_id = Some(batch_id),
        Err(err) => naming_context.parse_error = Some(err.to_string()),
    }
    naming_context
}

#[then("the decoded name is \"{name}\"")]
fn decoded_name_is(naming_context: &NamingContext, name: String) -> Result<(), StepError> {
    let Some(decoded) = naming_context.decoded.as_ref() else {
        return Err(StepError::Assertion(String::from("nothing was decoded")));
    };
    if decoded.name == name {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected name {name}, got {}",
            decoded.name
        )))
    }
}

#[then("the decoded batch matches the generated batch")]
fn decoded_batch_matches(naming_context: &NamingContext) -> Result<(), StepError> {
    let expected = naming_context.generated_batch();
    match naming_context.decoded_batch.as_ref() {
        Some(found) if *found == expected => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected batch {expected}, got {other:?}"
        ))),
    }
}

#[then("no batch is decoded")]
fn no_batch_decoded(naming_context: &NamingContext) -> Result<(), StepError> {
    match naming_context.decoded_batch.as_ref() {
        None => Ok(()),
        Some(found) => Err(StepError::Assertion(format!(
            "expected a foreign server, decoded batch {found}"
        ))),
    }
}

#[then("parsing fails with \"{fragment}\"")]
fn parsing_fails_with(naming_context: &NamingContext, fragment: String) -> Result<(), StepError> {
    let Some(message) = naming_context.parse_error.as_ref() else {
        return Err(StepError::Assertion(String::from(
            "expected parsing to fail",
        )));
    };
    if message.contains(&fragment) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected '{fragment}' in error, got: {message}"
        )))
    }
}
