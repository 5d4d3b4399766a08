//! Contract Test: Idempotency & Pass Gating
//!
//! Verifies that repeated passes converge and that the IP cache only lets
//! a pass through when there is something to do.
//!
//! Constraints verified:
//! - A second pass with the same address and unchanged records writes nothing
//! - An unchanged address skips the pass until the forced interval elapses
//! - A changed address reconciles immediately
//! - A pass with a failure is retried on the next pass, not within the pass
//!
//! If this test fails, passes are either writing redundantly or losing updates.

mod common;

use common::*;
use ddns_sync_core::config::EngineConfig;
use ddns_sync_core::{Reconciler, RecordType, UpdateStatus};

#[tokio::test]
async fn second_pass_is_a_no_op() {
    let provider = MockProvider::new().with_zone("example.com", "z1");
    let ip = FixedIpSource::dual("1.2.3.4", "2001:db8::1");
    let (reconciler, _events) = Reconciler::new(
        Box::new(provider.clone()),
        Box::new(ip.clone()),
        600,
        &every_pass_config(),
    )
    .expect("reconciler construction succeeds");
    let mut set = domains(&["home.example.com"], &["home.example.com"]);

    reconciler.run_pass(&mut set).await;
    let writes_after_first = provider.write_calls();
    assert_eq!(writes_after_first, 2);

    let second = reconciler.run_pass(&mut set).await;

    assert_eq!(provider.write_calls(), writes_after_first);
    assert_eq!(second.writes(), 0);
    assert_eq!(set.domains()[0].update_status, UpdateStatus::Success);
}

#[tokio::test]
async fn unchanged_address_is_skipped_until_forced() {
    let provider = MockProvider::new().with_zone("example.com", "z1");
    let ip = FixedIpSource::v4("1.2.3.4");
    let engine = EngineConfig {
        force_update_every: 3,
        ..EngineConfig::default()
    };
    let (reconciler, _events) =
        Reconciler::new(Box::new(provider.clone()), Box::new(ip.clone()), 600, &engine).unwrap();
    let mut set = domains(&["home.example.com"], &[]);

    reconciler.run_pass(&mut set).await;
    assert_eq!(provider.list_zones_calls(), 1);

    reconciler.run_pass(&mut set).await;
    reconciler.run_pass(&mut set).await;
    assert_eq!(provider.list_zones_calls(), 1);
    assert_eq!(set.domains()[0].update_status, UpdateStatus::NotSubmitted);

    reconciler.run_pass(&mut set).await;
    assert_eq!(provider.list_zones_calls(), 2);
    assert_eq!(provider.write_calls(), 1);
    assert_eq!(set.domains()[0].update_status, UpdateStatus::Success);
}

#[tokio::test]
async fn changed_address_reconciles_immediately() {
    let provider = MockProvider::new().with_zone("example.com", "z1");
    let ip = FixedIpSource::v4("1.2.3.4");
    let engine = EngineConfig {
        force_update_every: 0,
        ..EngineConfig::default()
    };
    let (reconciler, _events) =
        Reconciler::new(Box::new(provider.clone()), Box::new(ip.clone()), 600, &engine).unwrap();
    let mut set = domains(&["home.example.com"], &[]);

    reconciler.run_pass(&mut set).await;
    ip.set(RecordType::A, "5.6.7.8");
    reconciler.run_pass(&mut set).await;

    assert_eq!(
        provider.write_log(),
        vec!["create home 1.2.3.4".to_string(), "update new-0 5.6.7.8".to_string()]
    );
}

#[tokio::test]
async fn failed_pass_is_retried_on_the_next_pass_only() {
    let provider = MockProvider::new()
        .with_zone("example.com", "z1")
        .rejecting_creates();
    let ip = FixedIpSource::v4("1.2.3.4");
    let engine = EngineConfig {
        force_update_every: 0,
        ..EngineConfig::default()
    };
    let (reconciler, _events) =
        Reconciler::new(Box::new(provider.clone()), Box::new(ip.clone()), 600, &engine).unwrap();
    let mut set = domains(&["home.example.com"], &[]);

    reconciler.run_pass(&mut set).await;
    assert_eq!(provider.create_calls(), 1);
    assert_eq!(set.domains()[0].update_status, UpdateStatus::Failed);

    provider.heal();
    reconciler.run_pass(&mut set).await;
    assert_eq!(provider.create_calls(), 2);
    assert_eq!(set.domains()[0].update_status, UpdateStatus::Success);

    reconciler.run_pass(&mut set).await;
    assert_eq!(provider.create_calls(), 2);
    assert_eq!(provider.list_zones_calls(), 2);
}

#[tokio::test]
async fn ip_source_is_asked_once_per_type_per_pass() {
    let provider = MockProvider::new().with_zone("example.com", "z1");
    let ip = FixedIpSource::dual("1.2.3.4", "2001:db8::1");
    let (reconciler, _events) = Reconciler::new(
        Box::new(provider.clone()),
        Box::new(ip.clone()),
        600,
        &every_pass_config(),
    )
    .unwrap();
    let mut set = domains(
        &["a.example.com", "b.example.com", "c.example.com"],
        &["a.example.com"],
    );

    reconciler.run_pass(&mut set).await;

    assert_eq!(ip.calls(), 2);
}
