//! Shared fixtures for membership marker scenarios.

use flotilla::BatchId;
use flotilla::naming::DecodedName;
use rstest::fixture;

#[derive(Clone, Debug, Default)]
pub struct NamingContext {
    pub batch_id: Option<BatchId>,
    pub name: Option<String>,
    pub decoded: Option<DecodedName>,
    pub decoded_batch: Option<BatchId>,
    pub parse_error: Option<String>,
}

#[fixture]
pub fn naming_context() -> NamingContext {
    NamingContext::default()
}

impl NamingContext {
    pub fn generated_batch(&self) -> BatchId {
        self.batch_id
            .clone()
            .unwrap_or_else(|| panic!("test setup requires a generated batch"))
    }

    pub fn pending_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| panic!("test setup requires a server name"))
    }
}
