//! In-memory provisioning backend.
//!
//! Instances live in a process-local store and advance through the provider
//! state machine on a timer (`new → labelled → networked → active`). The
//! backend is deterministic enough for tests and doubles as a dry-run
//! provider. Failure injection and creation-time controls let tests drive
//! rollback, partial-failure, and age-based release paths.

mod generators;
mod lifecycle;

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::backend::{
    Backend, BackendFuture, InstanceId, InstanceRecord, InstanceSpec, InstanceStatus, ListFilter,
};
use crate::naming::MembershipEncoding;

pub use generators::{FIRST_ADDRESS, IpAllocator, SequentialIds};
pub use lifecycle::{LifecycleSchedule, Stage};

use lifecycle::Lifecycle;

/// Errors raised by the in-memory backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MemoryBackendError {
    /// Raised when a create failure was injected.
    #[error("creation request rejected")]
    CreateRejected,
    /// Raised when a delete failure was injected for the instance.
    #[error("delete rejected for instance {id}")]
    DeleteRejected {
        /// Instance whose deletion was rejected.
        id: InstanceId,
    },
    /// Raised when deleting an unknown instance.
    #[error("instance {id} not found")]
    NotFound {
        /// Requested instance.
        id: InstanceId,
    },
    /// Raised when a list failure was injected.
    #[error("listing rejected")]
    ListRejected,
}

#[derive(Clone, Debug)]
struct StoredInstance {
    id: InstanceId,
    spec: InstanceSpec,
    address: IpAddr,
    created_at: String,
    lifecycle: Lifecycle,
}

impl StoredInstance {
    fn observe(&self) -> InstanceRecord {
        let stage = self.lifecycle.stage();
        InstanceRecord {
            id: self.id.clone(),
            name: self.spec.name.clone(),
            status: if stage == Stage::Active {
                InstanceStatus::Active
            } else {
                InstanceStatus::Pending
            },
            addresses: if stage >= Stage::Networked {
                vec![self.address]
            } else {
                Vec::new()
            },
            created_at: self.created_at.clone(),
            tags: if stage >= Stage::Labelled {
                self.spec.tags.clone()
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    // Keyed by creation sequence so listings come back in creation order.
    instances: BTreeMap<u64, StoredInstance>,
    sequence: u64,
    ids: SequentialIds,
    addresses: IpAllocator,
    fail_next_create: bool,
    fail_next_list: bool,
    failing_deletes: BTreeSet<InstanceId>,
}

impl Store {
    fn insert(&mut self, spec: InstanceSpec, schedule: LifecycleSchedule) -> InstanceRecord {
        let stored = StoredInstance {
            id: self.ids.next_id(),
            spec,
            address: IpAddr::V4(self.addresses.allocate()),
            created_at: timestamp(Utc::now()),
            lifecycle: Lifecycle::start(schedule),
        };
        let record = stored.observe();
        self.sequence += 1;
        self.instances.insert(self.sequence, stored);
        record
    }

    fn find_mut(&mut self, id: &InstanceId) -> Option<&mut StoredInstance> {
        self.instances
            .values_mut()
            .find(|instance| &instance.id == id)
    }
}

/// Backend that keeps instances in memory.
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
    membership: MembershipEncoding,
    schedule: LifecycleSchedule,
    default_spec: InstanceSpec,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates a name-encoded backend with the default schedule.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            membership: MembershipEncoding::Name,
            schedule: LifecycleSchedule::default(),
            default_spec: default_spec(),
        }
    }

    /// Selects the membership encoding advertised by the backend.
    #[must_use]
    pub const fn with_membership(mut self, membership: MembershipEncoding) -> Self {
        self.membership = membership;
        self
    }

    /// Replaces the lifecycle schedule applied to new instances.
    #[must_use]
    pub const fn with_schedule(mut self, schedule: LifecycleSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Replaces the default spec that overrides are merged into.
    #[must_use]
    pub fn with_default_spec(mut self, spec: InstanceSpec) -> Self {
        self.default_spec = spec;
        self
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored instances, managed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store().instances.len()
    }

    /// Returns `true` when no instance is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store().instances.is_empty()
    }

    /// Returns `true` when `id` is still stored.
    #[must_use]
    pub fn contains(&self, id: &InstanceId) -> bool {
        self.store()
            .instances
            .values()
            .any(|instance| &instance.id == id)
    }

    /// Spec submitted for `id`.
    #[must_use]
    pub fn spec_of(&self, id: &InstanceId) -> Option<InstanceSpec> {
        self.store()
            .instances
            .values()
            .find(|instance| &instance.id == id)
            .map(|instance| instance.spec.clone())
    }

    /// Inserts an unmanaged instance that is immediately active.
    pub fn insert_foreign(&self, name: &str, tags: &[&str]) -> InstanceId {
        let spec = InstanceSpec {
            name: name.to_owned(),
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            ..self.default_spec.clone()
        };
        self.store()
            .insert(spec, LifecycleSchedule::immediate())
            .id
    }

    /// Rewrites the creation timestamp of each listed instance.
    pub fn set_created_at(&self, ids: &[InstanceId], at: DateTime<Utc>) {
        let mut store = self.store();
        for id in ids {
            if let Some(instance) = store.find_mut(id) {
                instance.created_at = timestamp(at);
            }
        }
    }

    /// Stores a verbatim creation timestamp, which need not be valid.
    pub fn set_raw_created_at(&self, id: &InstanceId, raw: impl Into<String>) {
        if let Some(instance) = self.store().find_mut(id) {
            instance.created_at = raw.into();
        }
    }

    /// Replaces the tags of `id`.
    pub fn set_tags(&self, id: &InstanceId, tags: &[&str]) {
        if let Some(instance) = self.store().find_mut(id) {
            instance.spec.tags = tags.iter().map(|tag| (*tag).to_owned()).collect();
        }
    }

    /// Makes the next `create` call fail without creating anything.
    pub fn fail_next_create(&self) {
        self.store().fail_next_create = true;
    }

    /// Makes the next `list` call fail.
    pub fn fail_next_list(&self) {
        self.store().fail_next_list = true;
    }

    /// Makes every delete of `id` fail.
    pub fn fail_delete_for(&self, id: &InstanceId) {
        self.store().failing_deletes.insert(id.clone());
    }
}

impl Backend for MemoryBackend {
    type Error = MemoryBackendError;

    fn membership(&self) -> MembershipEncoding {
        self.membership
    }

    fn default_spec(&self) -> InstanceSpec {
        self.default_spec.clone()
    }

    fn create<'a>(
        &'a self,
        specs: &'a [InstanceSpec],
    ) -> BackendFuture<'a, Vec<InstanceRecord>, Self::Error> {
        Box::pin(async move {
            let mut store = self.store();
            if std::mem::take(&mut store.fail_next_create) {
                return Err(MemoryBackendError::CreateRejected);
            }
            Ok(specs
                .iter()
                .map(|spec| store.insert(spec.clone(), self.schedule))
                .collect())
        })
    }

    fn list<'a>(
        &'a self,
        filter: &'a ListFilter,
    ) -> BackendFuture<'a, Vec<InstanceRecord>, Self::Error> {
        Box::pin(async move {
            let mut store = self.store();
            if std::mem::take(&mut store.fail_next_list) {
                return Err(MemoryBackendError::ListRejected);
            }
            Ok(store
                .instances
                .values()
                .map(StoredInstance::observe)
                .filter(|record| filter.matches(record))
                .collect())
        })
    }

    fn delete<'a>(&'a self, id: &'a InstanceId) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut store = self.store();
            if store.failing_deletes.contains(id) {
                return Err(MemoryBackendError::DeleteRejected { id: id.clone() });
            }
            let key = store
                .instances
                .iter()
                .find_map(|(key, instance)| (&instance.id == id).then_some(*key))
                .ok_or_else(|| MemoryBackendError::NotFound { id: id.clone() })?;
            store.instances.remove(&key);
            Ok(())
        })
    }
}

fn default_spec() -> InstanceSpec {
    InstanceSpec {
        name: String::from("vps"),
        image: String::from("ubuntu-24-04"),
        region: String::from("mem-1"),
        size: String::from("small"),
        public_ip: true,
        ipv6: false,
        tags: Vec::new(),
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests;
