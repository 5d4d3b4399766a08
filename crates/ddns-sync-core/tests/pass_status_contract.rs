//! Contract Test: Pass Status Model
//!
//! Verifies how a pass turns per-domain outcomes into domain statuses.
//!
//! Constraints verified:
//! - Every status is reset to NotSubmitted at pass start
//! - A skipped record type leaves statuses untouched
//! - A failure in either record type marks the domain Failed
//! - One domain's failure never affects another domain
//! - Lookup failures (zone or listing) never reach the write path

mod common;

use common::*;
use ddns_sync_core::{Reconciler, ReconciliationOutcome, RecordType, UpdateStatus};

fn reconciler(provider: &MockProvider, ip: &FixedIpSource) -> Reconciler {
    let (reconciler, _events) = Reconciler::new(
        Box::new(provider.clone()),
        Box::new(ip.clone()),
        600,
        &every_pass_config(),
    )
    .expect("reconciler construction succeeds");
    reconciler
}

#[tokio::test]
async fn aaaa_failure_marks_domain_failed_after_a_success() {
    let provider = MockProvider::new()
        .with_zone("example.com", "z1")
        .with_record("z1", "r4", "home", RecordType::A, "default", "1.2.3.4")
        .with_record("z1", "r6", "home", RecordType::Aaaa, "default", "2001:db8::9")
        .failing_update("r6");
    let ip = FixedIpSource::dual("1.2.3.4", "2001:db8::1");
    let mut set = domains(&["home.example.com"], &["home.example.com"]);
    assert_eq!(set.len(), 1);

    let report = reconciler(&provider, &ip).run_pass(&mut set).await;

    assert_eq!(set.domains()[0].update_status, UpdateStatus::Failed);
    assert_eq!(
        report.get("home.example.com", RecordType::A).unwrap().outcome,
        ReconciliationOutcome::NoChange
    );
    assert!(
        report
            .get("home.example.com", RecordType::Aaaa)
            .unwrap()
            .outcome
            .is_failure()
    );
}

#[tokio::test]
async fn a_failure_is_not_cleared_by_aaaa_success() {
    let provider = MockProvider::new()
        .with_zone("example.com", "z1")
        .with_record("z1", "r4", "home", RecordType::A, "default", "9.9.9.9")
        .with_record("z1", "r6", "home", RecordType::Aaaa, "default", "2001:db8::1")
        .rejecting_update("r4");
    let ip = FixedIpSource::dual("1.2.3.4", "2001:db8::1");
    let mut set = domains(&["home.example.com"], &["home.example.com"]);

    reconciler(&provider, &ip).run_pass(&mut set).await;

    assert_eq!(set.domains()[0].update_status, UpdateStatus::Failed);
}

#[tokio::test]
async fn skipped_type_leaves_domain_not_submitted() {
    let provider = MockProvider::new().with_zone("example.com", "z1");
    let ip = FixedIpSource::v4("1.2.3.4");
    let mut set = domains(&[], &["v6.example.com"]);

    let report = reconciler(&provider, &ip).run_pass(&mut set).await;

    assert_eq!(set.domains()[0].update_status, UpdateStatus::NotSubmitted);
    assert_eq!(provider.list_zones_calls(), 0);
    assert_eq!(
        report.get("v6.example.com", RecordType::Aaaa).unwrap().outcome,
        ReconciliationOutcome::Skipped
    );
}

#[tokio::test]
async fn statuses_reset_at_pass_start() {
    let provider = MockProvider::new()
        .with_zone("example.com", "z1")
        .failing_listing("home");
    let ip = FixedIpSource::v4("1.2.3.4");
    let reconciler = reconciler(&provider, &ip);
    let mut set = domains(&["home.example.com"], &[]);

    reconciler.run_pass(&mut set).await;
    assert_eq!(set.domains()[0].update_status, UpdateStatus::Failed);

    // The address disappears: the pass skips and the old Failed must not linger
    let empty = FixedIpSource::default();
    let (quiet, _events) =
        Reconciler::new(Box::new(provider.clone()), Box::new(empty), 600, &every_pass_config())
            .unwrap();
    quiet.run_pass(&mut set).await;
    assert_eq!(set.domains()[0].update_status, UpdateStatus::NotSubmitted);
}

#[tokio::test]
async fn one_failing_domain_does_not_affect_others() {
    let provider = MockProvider::new()
        .with_zone("example.com", "z1")
        .with_zone("example.net", "z2")
        .failing_zone_lookup("example.net");
    let ip = FixedIpSource::v4("1.2.3.4");
    let mut set = domains(&["a.example.com", "b.example.net", "c.example.com"], &[]);

    let report = reconciler(&provider, &ip).run_pass(&mut set).await;

    let statuses: Vec<UpdateStatus> = set.domains().iter().map(|d| d.update_status).collect();
    assert_eq!(
        statuses,
        vec![UpdateStatus::Success, UpdateStatus::Failed, UpdateStatus::Success]
    );
    assert!(matches!(
        report.get("b.example.net", RecordType::A).unwrap().outcome,
        ReconciliationOutcome::ZoneLookupFailed(_)
    ));
    assert_eq!(provider.create_calls(), 2);
}

#[tokio::test]
async fn listing_failure_never_writes() {
    let provider = MockProvider::new()
        .with_zone("example.com", "z1")
        .failing_listing("home");
    let ip = FixedIpSource::v4("1.2.3.4");
    let mut set = domains(&["home.example.com"], &[]);

    let report = reconciler(&provider, &ip).run_pass(&mut set).await;

    assert_eq!(provider.write_calls(), 0);
    match &report.get("home.example.com", RecordType::A).unwrap().outcome {
        ReconciliationOutcome::ListFailed(reason) => assert!(reason.contains("InternalError")),
        other => panic!("expected ListFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn ip_source_failure_skips_the_pass() {
    let provider = MockProvider::new().with_zone("example.com", "z1");
    let ip = FixedIpSource::v4("1.2.3.4");
    ip.fail();
    let mut set = domains(&["home.example.com"], &[]);

    let report = reconciler(&provider, &ip).run_pass(&mut set).await;

    assert_eq!(provider.list_zones_calls(), 0);
    assert_eq!(set.domains()[0].update_status, UpdateStatus::NotSubmitted);
    assert!(report.desired[0].is_skip());
}

#[tokio::test]
async fn wrong_address_family_skips_the_type() {
    let provider = MockProvider::new().with_zone("example.com", "z1");
    let ip = FixedIpSource::default();
    ip.set(RecordType::Aaaa, "1.2.3.4");
    let mut set = domains(&[], &["home.example.com"]);

    reconciler(&provider, &ip).run_pass(&mut set).await;

    assert_eq!(provider.list_zones_calls(), 0);
    assert_eq!(set.domains()[0].update_status, UpdateStatus::NotSubmitted);
}
