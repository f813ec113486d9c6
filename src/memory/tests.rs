//! Unit tests for the in-memory backend.

use std::net::Ipv4Addr;
use std::time::Duration;

use rstest::{fixture, rstest};
use tokio::time::sleep;

use super::*;

#[fixture]
fn spec() -> InstanceSpec {
    InstanceSpec::builder()
        .name("vps")
        .image("ubuntu-24-04")
        .region("mem-1")
        .size("small")
        .tag("team:infra")
        .build()
        .unwrap_or_else(|err| panic!("spec should build: {err}"))
}

#[rstest]
#[case(Duration::ZERO, Stage::New)]
#[case(Duration::from_millis(2), Stage::Labelled)]
#[case(Duration::from_millis(6), Stage::Labelled)]
#[case(Duration::from_millis(7), Stage::Networked)]
#[case(Duration::from_millis(11), Stage::Networked)]
#[case(Duration::from_millis(12), Stage::Active)]
fn default_schedule_advances_in_order(#[case] elapsed: Duration, #[case] expected: Stage) {
    assert_eq!(LifecycleSchedule::default().stage_at(elapsed), expected);
}

#[rstest]
fn stalled_schedule_never_activates() {
    let schedule = LifecycleSchedule::never_active();
    assert_eq!(schedule.stage_at(Duration::from_secs(3600)), Stage::Networked);
}

#[rstest]
fn unlabelled_schedule_stays_new() {
    let schedule = LifecycleSchedule::never_labelled();
    assert_eq!(schedule.stage_at(Duration::from_secs(3600)), Stage::New);
}

#[rstest]
fn sequential_ids_start_at_one() {
    let mut ids = SequentialIds::default();
    assert_eq!(ids.next_id(), InstanceId::from("1"));
    assert_eq!(ids.next_id(), InstanceId::from("2"));
}

#[rstest]
fn ip_allocator_carries_into_higher_octets() {
    let mut allocator = IpAllocator::starting_at(Ipv4Addr::new(192, 168, 2, 255));
    assert_eq!(allocator.allocate(), Ipv4Addr::new(192, 168, 2, 255));
    assert_eq!(allocator.allocate(), Ipv4Addr::new(192, 168, 3, 0));
}

#[rstest]
fn ip_allocator_wraps_after_last_address() {
    let mut allocator = IpAllocator::starting_at(Ipv4Addr::BROADCAST);
    assert_eq!(allocator.allocate(), Ipv4Addr::BROADCAST);
    assert_eq!(allocator.allocate(), Ipv4Addr::new(1, 0, 0, 0));
}

#[rstest]
fn independent_backends_do_not_share_generators() {
    let first = MemoryBackend::new();
    let second = MemoryBackend::new();
    let a = first.insert_foreign("a", &[]);
    let b = second.insert_foreign("b", &[]);
    assert_eq!(a, b);
}

#[rstest]
#[tokio::test]
async fn new_instances_reveal_state_in_order(spec: InstanceSpec) {
    let backend = MemoryBackend::new().with_schedule(LifecycleSchedule {
        labelling: Duration::from_millis(20),
        networking: Duration::from_millis(20),
        activation: Some(Duration::from_millis(20)),
    });
    let created = backend
        .create(std::slice::from_ref(&spec))
        .await
        .unwrap_or_else(|err| panic!("create: {err}"));
    let record = created.first().unwrap_or_else(|| panic!("one record"));
    assert_eq!(record.status, InstanceStatus::Pending);
    assert!(record.addresses.is_empty());
    assert!(record.tags.is_empty());
    assert_eq!(record.first_ipv4(), None);

    sleep(Duration::from_millis(80)).await;
    let listed = backend
        .list(&ListFilter::All)
        .await
        .unwrap_or_else(|err| panic!("list: {err}"));
    let settled = listed.first().unwrap_or_else(|| panic!("one record"));
    assert_eq!(settled.status, InstanceStatus::Active);
    assert_eq!(settled.first_ipv4(), Some(FIRST_ADDRESS));
    assert_eq!(settled.tags, vec![String::from("team:infra")]);
}

#[rstest]
#[tokio::test]
async fn tag_filter_only_returns_tagged_instances(spec: InstanceSpec) {
    let backend = MemoryBackend::new().with_schedule(LifecycleSchedule::immediate());
    backend
        .create(std::slice::from_ref(&spec))
        .await
        .unwrap_or_else(|err| panic!("create: {err}"));
    backend.insert_foreign("other", &["unrelated"]);

    let tagged = backend
        .list(&ListFilter::Tagged(String::from("team:infra")))
        .await
        .unwrap_or_else(|err| panic!("list: {err}"));
    assert_eq!(tagged.len(), 1);
    assert_eq!(backend.len(), 2);
}

#[rstest]
#[tokio::test]
async fn injected_create_failure_creates_nothing(spec: InstanceSpec) {
    let backend = MemoryBackend::new();
    backend.fail_next_create();
    let result = backend.create(std::slice::from_ref(&spec)).await;
    assert_eq!(result, Err(MemoryBackendError::CreateRejected));
    assert!(backend.is_empty());

    let retry = backend.create(std::slice::from_ref(&spec)).await;
    assert!(retry.is_ok(), "failure injection is one-shot");
}

#[rstest]
#[tokio::test]
async fn delete_removes_instances_and_reports_failures() {
    let backend = MemoryBackend::new();
    let kept = backend.insert_foreign("kept", &[]);
    let removed = backend.insert_foreign("removed", &[]);
    backend.fail_delete_for(&kept);

    assert_eq!(
        backend.delete(&kept).await,
        Err(MemoryBackendError::DeleteRejected { id: kept.clone() })
    );
    assert_eq!(backend.delete(&removed).await, Ok(()));
    assert_eq!(
        backend.delete(&removed).await,
        Err(MemoryBackendError::NotFound {
            id: removed.clone()
        })
    );
    assert!(backend.contains(&kept));
    assert!(!backend.contains(&removed));
}
