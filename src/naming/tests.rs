//! Unit tests for batch identity encoding.

use super::*;
use rstest::rstest;

#[rstest]
#[case("test-name")]
#[case("")]
#[case("-")]
#[case("--")]
fn decode_name_leaves_plain_names_untouched(#[case] name: &str) {
    assert_eq!(
        decode_name(name),
        DecodedName {
            name: name.to_owned(),
            batch_id: None,
        }
    );
}

#[rstest]
#[case("")]
#[case("-")]
#[case("--")]
#[case("test")]
#[case("-test")]
#[case("-test-")]
#[case("test-name")]
#[case("-test-name-")]
#[case("----test-name-----")]
fn encoded_names_round_trip(#[case] name: &str) {
    let batch_id = BatchId::generate(MembershipEncoding::Name);
    let full_name = encode_name(name, &batch_id);

    let components: Vec<&str> = full_name.split('-').collect();
    assert_eq!(components.len(), name.split('-').count() + 2);
    assert_eq!(components.last().copied(), Some(SERVICE_ID));
    assert_eq!(full_name, format!("{name}-{batch_id}-{SERVICE_ID}"));
    assert!(is_id(batch_id.as_str()));

    assert_eq!(
        decode_name(&full_name),
        DecodedName {
            name: name.to_owned(),
            batch_id: Some(batch_id),
        }
    );
}

#[rstest]
fn decode_name_rejects_badly_sized_identifiers() {
    let short = "0123456789abcdef0123456789abcde";
    let name = format!("vps-{short}-{SERVICE_ID}");
    assert_eq!(decode_name(&name).batch_id, None);
    assert_eq!(decode_name(&name).name, name);
}

#[rstest]
fn decode_name_requires_service_suffix() {
    let batch_id = BatchId::generate(MembershipEncoding::Name);
    let name = format!("vps-{batch_id}-0000000000000000");
    assert_eq!(decode_name(&name).batch_id, None);
}

#[rstest]
fn decode_name_accepts_bare_identifier_and_suffix() {
    let batch_id = BatchId::generate(MembershipEncoding::Name);
    let decoded = decode_name(&format!("{batch_id}-{SERVICE_ID}"));
    assert_eq!(decoded.name, "");
    assert_eq!(decoded.batch_id, Some(batch_id));
}

#[rstest]
#[case("0123456789abcdef0123456789abcdef", true)]
#[case("0123456789abcdef0123456789abcde", false)]
#[case("0123456789abcdef0123456789abcdef0", false)]
#[case("0123456789ABCDEF0123456789ABCDEF", false)]
#[case("0123456789abcdef0123456789abcdeg", false)]
#[case("", false)]
fn is_id_checks_length_and_charset(#[case] candidate: &str, #[case] expected: bool) {
    assert_eq!(is_id(candidate), expected);
}

#[rstest]
fn generated_name_ids_are_distinct_hex() {
    let first = BatchId::generate(MembershipEncoding::Name);
    let second = BatchId::generate(MembershipEncoding::Name);
    assert_ne!(first, second);
    assert!(is_id(first.as_str()));
    assert!(is_id(second.as_str()));
}

#[rstest]
fn generated_tag_ids_carry_prefix_and_validate() {
    let batch_id = BatchId::generate(MembershipEncoding::Tags);
    assert!(batch_id.as_str().starts_with(BATCH_TAG_PREFIX));
    assert!(is_batch_tag(batch_id.as_str()));
    assert_eq!(validate_tag(batch_id.as_str()), Ok(()));
}

#[rstest]
fn batch_tags_round_trip() {
    let batch_id = BatchId::generate(MembershipEncoding::Tags);
    let tags = batch_tags(&batch_id);
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().any(|tag| tag == AUTO_CREATED_TAG));
    assert_eq!(decode_tags(&tags), Some(batch_id));
}

#[rstest]
fn decode_tags_requires_auto_created_marker() {
    let batch_id = BatchId::generate(MembershipEncoding::Tags);
    assert_eq!(decode_tags(&[batch_id.as_str()]), None);
}

#[rstest]
fn decode_tags_rejects_ambiguous_membership() {
    let first = BatchId::generate(MembershipEncoding::Tags);
    let second = BatchId::generate(MembershipEncoding::Tags);
    let tags = [first.as_str(), second.as_str(), AUTO_CREATED_TAG];
    assert_eq!(decode_tags(&tags), None);
}

#[rstest]
#[case("cfa36a570079-not-a-uuid")]
#[case("cfa36a570079-55B98C5C-F54D-4AB8-8CDE-9E584F866A8E")]
#[case("cfa36a57007955b98c5cf54d4ab88cde")]
fn decode_tags_ignores_malformed_batch_tags(#[case] candidate: &str) {
    assert_eq!(decode_tags(&[candidate, AUTO_CREATED_TAG]), None);
}

#[rstest]
#[case("web")]
#[case("env:prod")]
#[case("a_b-c.d")]
fn validate_tag_accepts_allowed_charset(#[case] tag: &str) {
    assert_eq!(validate_tag(tag), Ok(()));
}

#[rstest]
fn validate_tag_rejects_empty_tags() {
    assert_eq!(validate_tag(""), Err(NamingError::EmptyTag));
}

#[rstest]
#[case("has space", ' ')]
#[case("slash/tag", '/')]
#[case("équipe", 'é')]
fn validate_tag_rejects_invalid_characters(#[case] tag: &str, #[case] invalid: char) {
    assert_eq!(
        validate_tag(tag),
        Err(NamingError::InvalidTagCharacter {
            tag: tag.to_owned(),
            invalid,
        })
    );
}

#[rstest]
fn validate_tag_enforces_length_limit() {
    let at_limit = "a".repeat(MAX_TAG_LEN);
    assert_eq!(validate_tag(&at_limit), Ok(()));

    let too_long = "a".repeat(MAX_TAG_LEN + 1);
    assert_eq!(
        validate_tag(&too_long),
        Err(NamingError::TagTooLong {
            tag: too_long.clone(),
            len: MAX_TAG_LEN + 1,
        })
    );
}

#[rstest]
fn parse_accepts_both_shapes_and_rejects_others() {
    let name_id = BatchId::generate(MembershipEncoding::Name);
    let tag_id = BatchId::generate(MembershipEncoding::Tags);
    assert_eq!(BatchId::parse(name_id.as_str()), Ok(name_id));
    assert_eq!(BatchId::parse(tag_id.as_str()), Ok(tag_id));
    assert_eq!(
        BatchId::parse("batch-1"),
        Err(NamingError::InvalidBatchId {
            value: String::from("batch-1"),
        })
    );
}
