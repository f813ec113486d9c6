//! Batch identity and membership encoding.
//!
//! Every instance created by one `acquire` call carries a marker that
//! decodes to exactly one [`BatchId`]. Backends embed the marker either in
//! the instance name (`<name>-<batch>-<service id>`) or in the tag set
//! (`<batch tag>` plus [`AUTO_CREATED_TAG`]). Instances without a decodable
//! marker are foreign and never touched.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Fixed suffix marking instance names created by this crate.
pub const SERVICE_ID: &str = "68a68fd3ccb7f4bf";

/// Fixed tag marking instances created by this crate on tag-based backends.
pub const AUTO_CREATED_TAG: &str = "ad01a05d-35cf-4521-9ce7-a97f17fb9341";

/// Prefix carried by every tag-encoded batch identifier.
pub const BATCH_TAG_PREFIX: &str = "cfa36a570079-";

/// Length of a name-encoded batch identifier (16 random bytes, hex).
pub const ID_LEN: usize = 32;

/// Longest tag value accepted by [`validate_tag`].
pub const MAX_TAG_LEN: usize = 255;

const NAME_SEPARATOR: char = '-';

/// How a backend correlates instances with their batch.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipEncoding {
    /// Membership is embedded in the instance name at creation time.
    #[default]
    Name,
    /// Membership is carried by the tag set, possibly applied after the
    /// creation request is acknowledged.
    Tags,
}

impl MembershipEncoding {
    /// Returns `true` when membership may become visible only after the
    /// creation request returns.
    #[must_use]
    pub const fn is_applied_asynchronously(self) -> bool {
        matches!(self, Self::Tags)
    }
}

/// Opaque identifier shared by every instance of one batch.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct BatchId(String);

impl BatchId {
    /// Generates a fresh identifier in the shape required by `encoding`.
    #[must_use]
    pub fn generate(encoding: MembershipEncoding) -> Self {
        let uuid = Uuid::new_v4();
        match encoding {
            MembershipEncoding::Name => Self(uuid.simple().to_string()),
            MembershipEncoding::Tags => Self(format!("{BATCH_TAG_PREFIX}{}", uuid.hyphenated())),
        }
    }

    /// Parses a caller-supplied identifier, accepting either encoding.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::InvalidBatchId`] when `value` matches neither
    /// the name nor the tag shape.
    pub fn parse(value: &str) -> Result<Self, NamingError> {
        let trimmed = value.trim();
        if is_id(trimmed) || is_batch_tag(trimmed) {
            return Ok(Self(trimmed.to_owned()));
        }
        Err(NamingError::InvalidBatchId {
            value: value.to_owned(),
        })
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BatchId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Result of decoding an instance name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedName {
    /// Caller-visible name with the batch marker stripped.
    pub name: String,
    /// Batch identifier, present only when the name carried a valid marker.
    pub batch_id: Option<BatchId>,
}

/// Errors raised while validating identities and tags.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum NamingError {
    /// Raised when a tag is empty.
    #[error("tag must not be empty")]
    EmptyTag,
    /// Raised when a tag exceeds [`MAX_TAG_LEN`] characters.
    #[error("tag '{tag}' is {len} characters long; the limit is {MAX_TAG_LEN}")]
    TagTooLong {
        /// Offending tag.
        tag: String,
        /// Length in characters.
        len: usize,
    },
    /// Raised when a tag contains characters outside `[A-Za-z0-9:_.-]`.
    #[error("tag '{tag}' contains invalid character '{invalid}'")]
    InvalidTagCharacter {
        /// Offending tag.
        tag: String,
        /// First character outside the allowed set.
        invalid: char,
    },
    /// Raised when a caller-supplied batch identifier is malformed.
    #[error("'{value}' is not a batch identifier")]
    InvalidBatchId {
        /// Value supplied by the caller.
        value: String,
    },
}

/// Returns `true` when `candidate` is a name-encoded batch identifier:
/// exactly [`ID_LEN`] lowercase hex characters.
#[must_use]
pub fn is_id(candidate: &str) -> bool {
    candidate.len() == ID_LEN
        && candidate
            .bytes()
            .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
}

/// Returns `true` when `candidate` is a tag-encoded batch identifier.
#[must_use]
pub fn is_batch_tag(candidate: &str) -> bool {
    candidate
        .strip_prefix(BATCH_TAG_PREFIX)
        .and_then(|rest| Uuid::try_parse(rest).ok().map(|uuid| (rest, uuid)))
        .is_some_and(|(rest, uuid)| uuid.hyphenated().to_string() == rest)
}

/// Embeds `batch_id` into an instance name.
#[must_use]
pub fn encode_name(name: &str, batch_id: &BatchId) -> String {
    format!("{name}{NAME_SEPARATOR}{batch_id}{NAME_SEPARATOR}{SERVICE_ID}")
}

/// Recovers the caller name and batch identifier from an instance name.
///
/// Names without the service suffix, or whose batch segment is not a valid
/// identifier, decode to the unchanged name and no batch.
#[must_use]
pub fn decode_name(full_name: &str) -> DecodedName {
    let mut segments = full_name.rsplitn(3, NAME_SEPARATOR);
    let service = segments.next();
    let candidate = segments.next();
    let rest = segments.next();

    match (service, candidate, rest) {
        (Some(SERVICE_ID), Some(id), name) if is_id(id) => DecodedName {
            name: name.unwrap_or_default().to_owned(),
            batch_id: Some(BatchId(id.to_owned())),
        },
        _ => DecodedName {
            name: full_name.to_owned(),
            batch_id: None,
        },
    }
}

/// Returns the tags that mark an instance as a member of `batch_id`.
#[must_use]
pub fn batch_tags(batch_id: &BatchId) -> Vec<String> {
    vec![batch_id.as_str().to_owned(), AUTO_CREATED_TAG.to_owned()]
}

/// Recovers the batch identifier from a tag set.
///
/// The set must carry [`AUTO_CREATED_TAG`] and exactly one batch tag;
/// anything else decodes to `None`.
#[must_use]
pub fn decode_tags<S: AsRef<str>>(tags: &[S]) -> Option<BatchId> {
    if !tags.iter().any(|tag| tag.as_ref() == AUTO_CREATED_TAG) {
        return None;
    }
    let mut candidates = tags
        .iter()
        .map(AsRef::as_ref)
        .filter(|tag| is_batch_tag(tag));
    let first = candidates.next()?;
    if candidates.any(|other| other != first) {
        return None;
    }
    Some(BatchId(first.to_owned()))
}

/// Checks a tag against the provider charset and length limits.
///
/// # Errors
///
/// Returns [`NamingError`] describing the first violated constraint.
pub fn validate_tag(tag: &str) -> Result<(), NamingError> {
    if tag.is_empty() {
        return Err(NamingError::EmptyTag);
    }
    let len = tag.chars().count();
    if len > MAX_TAG_LEN {
        return Err(NamingError::TagTooLong {
            tag: tag.to_owned(),
            len,
        });
    }
    if let Some(invalid) = tag
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, ':' | '_' | '-' | '.')))
    {
        return Err(NamingError::InvalidTagCharacter {
            tag: tag.to_owned(),
            invalid,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
