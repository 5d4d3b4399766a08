//! Test doubles and common utilities for reconciliation contract tests
//!
//! The mock provider keeps an in-memory zone/record store that writes
//! actually change, so a second pass sees the result of the first. Every
//! call is counted and failures can be scripted per root domain, host or
//! record ID.

#![allow(dead_code)]

use ddns_sync_core::config::EngineConfig;
use ddns_sync_core::error::{Error, Result};
use ddns_sync_core::traits::{IpSource, ProviderAdapter, Record, RecordSpec, WriteOutcome, Zone};
use ddns_sync_core::{DomainSet, RecordType};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared state behind [`MockProvider`]
#[derive(Default)]
struct MockState {
    zones: Mutex<HashMap<String, Vec<Zone>>>,
    records: Mutex<Vec<(String, Record)>>,
    next_id: AtomicUsize,

    failing_zone_lookups: Mutex<HashSet<String>>,
    failing_listings: Mutex<HashSet<String>>,
    rejected_ids: Mutex<HashSet<String>>,
    failing_ids: Mutex<HashSet<String>>,
    reject_creates: Mutex<bool>,

    list_zones_calls: AtomicUsize,
    list_records_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    write_log: Mutex<Vec<String>>,

    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// A recording ProviderAdapter backed by an in-memory store
///
/// Clones share the same store and counters.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<MockState>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider sharing store and counters with `other`
    pub fn sharing_counters_with(other: &MockProvider) -> Self {
        other.clone()
    }

    /// Host a zone for `root`
    pub fn with_zone(self, root: &str, zone_id: &str) -> Self {
        self.state
            .zones
            .lock()
            .unwrap()
            .entry(root.to_string())
            .or_default()
            .push(Zone::new(zone_id, root));
        self
    }

    /// Seed an existing record in `zone_id`
    pub fn with_record(
        self,
        zone_id: &str,
        id: &str,
        host: &str,
        record_type: RecordType,
        line: &str,
        value: &str,
    ) -> Self {
        self.state.records.lock().unwrap().push((
            zone_id.to_string(),
            Record {
                id: id.to_string(),
                host: host.to_string(),
                record_type,
                line: line.to_string(),
                ttl: 300,
                value: value.to_string(),
            },
        ));
        self
    }

    /// Make zone lookups for `root` fail with a transport error
    pub fn failing_zone_lookup(self, root: &str) -> Self {
        self.state
            .failing_zone_lookups
            .lock()
            .unwrap()
            .insert(root.to_string());
        self
    }

    /// Make record listings for `host` fail with a vendor error
    pub fn failing_listing(self, host: &str) -> Self {
        self.state
            .failing_listings
            .lock()
            .unwrap()
            .insert(host.to_string());
        self
    }

    /// Make updates of record `id` come back rejected
    pub fn rejecting_update(self, id: &str) -> Self {
        self.state.rejected_ids.lock().unwrap().insert(id.to_string());
        self
    }

    /// Make updates of record `id` fail with a transport error
    pub fn failing_update(self, id: &str) -> Self {
        self.state.failing_ids.lock().unwrap().insert(id.to_string());
        self
    }

    /// Make every create come back rejected
    pub fn rejecting_creates(self) -> Self {
        *self.state.reject_creates.lock().unwrap() = true;
        self
    }

    /// Delay every zone lookup (to observe concurrency)
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Stop rejecting or failing anything
    pub fn heal(&self) {
        self.state.failing_zone_lookups.lock().unwrap().clear();
        self.state.failing_listings.lock().unwrap().clear();
        self.state.rejected_ids.lock().unwrap().clear();
        self.state.failing_ids.lock().unwrap().clear();
        *self.state.reject_creates.lock().unwrap() = false;
    }

    pub fn list_zones_calls(&self) -> usize {
        self.state.list_zones_calls.load(Ordering::SeqCst)
    }

    pub fn list_records_calls(&self) -> usize {
        self.state.list_records_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.state.update_calls.load(Ordering::SeqCst)
    }

    /// Number of create and update calls
    pub fn write_calls(&self) -> usize {
        self.create_calls() + self.update_calls()
    }

    /// Writes in call order, as `create host value` / `update id value`
    pub fn write_log(&self) -> Vec<String> {
        self.state.write_log.lock().unwrap().clone()
    }

    /// Highest number of concurrent zone lookups observed
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// Current records at `host` of `record_type`, in store order
    pub fn records_at(&self, host: &str, record_type: RecordType) -> Vec<Record> {
        self.state
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.host == host && r.record_type == record_type)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Total number of stored records
    pub fn record_count(&self) -> usize {
        self.state.records.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for MockProvider {
    async fn list_zones(&self, root_domain: &str) -> Result<Vec<Zone>> {
        self.state.list_zones_calls.fetch_add(1, Ordering::SeqCst);

        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.state.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.state.failing_zone_lookups.lock().unwrap().contains(root_domain) {
            return Err(Error::transport("mock", "connection reset"));
        }

        Ok(self
            .state
            .zones
            .lock()
            .unwrap()
            .get(root_domain)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_records(
        &self,
        zone: &Zone,
        host: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>> {
        self.state.list_records_calls.fetch_add(1, Ordering::SeqCst);

        if self.state.failing_listings.lock().unwrap().contains(host) {
            return Err(Error::vendor("mock", "InternalError", "listing unavailable"));
        }

        Ok(self
            .state
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(z, r)| z == &zone.id && r.host == host && r.record_type == record_type)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_record(&self, zone: &Zone, spec: &RecordSpec) -> Result<WriteOutcome> {
        self.state.create_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .write_log
            .lock()
            .unwrap()
            .push(format!("create {} {}", spec.host, spec.value));

        if *self.state.reject_creates.lock().unwrap() {
            return Ok(WriteOutcome::Rejected {
                message: "[RecordConflict] record exists".to_string(),
            });
        }

        let id = format!("new-{}", self.state.next_id.fetch_add(1, Ordering::SeqCst));
        self.state.records.lock().unwrap().push((
            zone.id.clone(),
            Record {
                id,
                host: spec.host.clone(),
                record_type: spec.record_type,
                line: spec.line.clone(),
                ttl: spec.ttl,
                value: spec.value.clone(),
            },
        ));
        Ok(WriteOutcome::Applied)
    }

    async fn update_record(&self, _zone: &Zone, record: &Record) -> Result<WriteOutcome> {
        self.state.update_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .write_log
            .lock()
            .unwrap()
            .push(format!("update {} {}", record.id, record.value));

        if self.state.failing_ids.lock().unwrap().contains(&record.id) {
            return Err(Error::transport("mock", "request timed out"));
        }
        if self.state.rejected_ids.lock().unwrap().contains(&record.id) {
            return Ok(WriteOutcome::Rejected {
                message: "[Throttled] too many requests".to_string(),
            });
        }

        let mut records = self.state.records.lock().unwrap();
        if let Some((_, stored)) = records.iter_mut().find(|(_, r)| r.id == record.id) {
            *stored = record.clone();
        }
        Ok(WriteOutcome::Applied)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Shared state behind [`FixedIpSource`]
#[derive(Default)]
struct IpState {
    addresses: Mutex<HashMap<RecordType, IpAddr>>,
    failing: Mutex<bool>,
    calls: AtomicUsize,
}

/// An IpSource returning whatever the test sets
///
/// Clones share the same addresses and counter.
#[derive(Clone, Default)]
pub struct FixedIpSource {
    state: Arc<IpState>,
}

impl FixedIpSource {
    /// Source with only an IPv4 address
    pub fn v4(ip: &str) -> Self {
        let source = Self::default();
        source.set(RecordType::A, ip);
        source
    }

    /// Source with both addresses
    pub fn dual(v4: &str, v6: &str) -> Self {
        let source = Self::v4(v4);
        source.set(RecordType::Aaaa, v6);
        source
    }

    /// Change the address returned for `record_type`
    pub fn set(&self, record_type: RecordType, ip: &str) {
        self.state
            .addresses
            .lock()
            .unwrap()
            .insert(record_type, ip.parse().unwrap());
    }

    /// Make every lookup fail
    pub fn fail(&self) {
        *self.state.failing.lock().unwrap() = true;
    }

    /// Number of lookups
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self, record_type: RecordType) -> Result<Option<IpAddr>> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        if *self.state.failing.lock().unwrap() {
            return Err(Error::ip_source("all lookups failed"));
        }
        Ok(self.state.addresses.lock().unwrap().get(&record_type).copied())
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// Engine settings that reconcile on every pass
pub fn every_pass_config() -> EngineConfig {
    EngineConfig {
        force_update_every: 1,
        ..EngineConfig::default()
    }
}

/// Build a domain set from IPv4 and IPv6 lists
pub fn domains(ipv4: &[&str], ipv6: &[&str]) -> DomainSet {
    let ipv4: Vec<String> = ipv4.iter().map(|s| s.to_string()).collect();
    let ipv6: Vec<String> = ipv6.iter().map(|s| s.to_string()).collect();
    DomainSet::from_lists(&ipv4, &ipv6).unwrap()
}

/// Captures formatted tracing output of the current thread
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's events into the capture until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Captured lines at `level` (e.g. "WARN")
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(level))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
