//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Asking the IpSource for the desired address per record type
//! - Gating passes through the per-type IP cache
//! - Resolving zones and locating records via the ProviderAdapter
//! - Deciding and carrying out the write actions
//! - Folding per-domain outcomes into domain statuses
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   DesiredValue   ┌──────────────┐
//! │  IpSource   │─────────────────▶│  Reconciler  │──── EngineEvent ───▶ receiver
//! └─────────────┘   (via IpCache)  └──────────────┘
//!                                         │ per domain, at most `concurrency` at once
//!                                         ▼
//!          resolve_zone ─▶ locate_records ─▶ decide ─▶ create/update
//!                                         │
//!                                         ▼
//!                               ReconciliationOutcome
//!                                         │
//!                                         ▼
//!                              StatusTracker (sequential)
//! ```
//!
//! ## Pass Flow
//!
//! 1. Reset every domain status to `NotSubmitted`
//! 2. For A, then AAAA: fetch the desired value; skip the type if it is empty
//! 3. Reconcile the type's domains concurrently; each returns one outcome
//! 4. Apply the outcomes to the statuses, then tell the IP cache whether anything failed
//!
//! Nothing is retried within a pass. A failed type is reconciled again on
//! the next pass even if the address has not changed.

pub mod decision;
pub mod resolve;
pub mod status;

pub use decision::{Action, DesiredRecord, decide};
pub use resolve::{locate_records, resolve_zone};
pub use status::{ActionResult, ReconciliationOutcome, StatusTracker};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::config::{DdnsConfig, EngineConfig};
use crate::domain::{DesiredValue, Domain, DomainSet, RecordType};
use crate::error::{Error, Result};
use crate::ip_cache::IpCache;
use crate::traits::{IpSource, ProviderAdapter, WriteOutcome, Zone};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A record type is being reconciled for an address
    PassStarted {
        record_type: RecordType,
        ip: String,
    },

    /// A record type was skipped (no usable or no changed address)
    PassSkipped {
        record_type: RecordType,
        domains: usize,
    },

    /// One domain finished for one record type
    DomainReconciled {
        domain: String,
        record_type: RecordType,
        outcome: ReconciliationOutcome,
    },

    /// A record type finished
    PassFinished {
        record_type: RecordType,
        succeeded: usize,
        failed: usize,
    },
}

/// Result of one domain's reconciliation for one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    /// Fully qualified domain name
    pub domain: String,
    /// Record type
    pub record_type: RecordType,
    /// How it ended
    pub outcome: ReconciliationOutcome,
    /// Actions carried out, in order
    pub actions: Vec<ActionResult>,
}

impl DomainReport {
    fn new(domain: &Domain, record_type: RecordType, outcome: ReconciliationOutcome) -> Self {
        Self {
            domain: domain.fqdn(),
            record_type,
            outcome,
            actions: Vec::new(),
        }
    }
}

/// Summary of a full pass over both record types
#[derive(Debug, Clone)]
pub struct PassReport {
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// When the pass finished
    pub finished_at: DateTime<Utc>,
    /// Desired value used per record type (empty for skipped types)
    pub desired: Vec<DesiredValue>,
    /// Per-domain results, A before AAAA, in configuration order
    pub domains: Vec<DomainReport>,
}

impl PassReport {
    /// Number of domain reconciliations that failed
    pub fn failures(&self) -> usize {
        self.domains.iter().filter(|d| d.outcome.is_failure()).count()
    }

    /// Number of domain reconciliations that wrote to the provider
    pub fn writes(&self) -> usize {
        self.domains.iter().filter(|d| d.outcome.wrote()).count()
    }

    /// Report for a domain and record type
    pub fn get(&self, fqdn: &str, record_type: RecordType) -> Option<&DomainReport> {
        self.domains
            .iter()
            .find(|d| d.domain == fqdn && d.record_type == record_type)
    }
}

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`] or [`Reconciler::from_config()`]
/// 2. Call [`Reconciler::run_pass()`] once per interval
/// 3. Drop to cleanup
///
/// ## Concurrency
///
/// Record types run one after the other. Within a type, domains run on a
/// bounded pool of `concurrency` in-flight reconciliations. Statuses are
/// only written after the pool drains.
pub struct Reconciler {
    /// DNS provider adapter
    provider: Box<dyn ProviderAdapter>,

    /// Source of the desired addresses
    ip_source: Box<dyn IpSource>,

    /// TTL for created and updated records
    ttl: u32,

    /// Maximum in-flight domain reconciliations
    concurrency: usize,

    /// Forced pass interval handed to new IP caches
    force_update_every: u32,

    /// Pass gate per record type
    caches: Mutex<HashMap<RecordType, IpCache>>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: Provider adapter implementation
    /// - `ip_source`: IP source implementation
    /// - `ttl`: TTL applied on writes
    /// - `engine`: Engine settings
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields engine events
    pub fn new(
        provider: Box<dyn ProviderAdapter>,
        ip_source: Box<dyn IpSource>,
        ttl: u32,
        engine: &EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        engine.validate()?;
        if ttl == 0 {
            return Err(Error::config("TTL must be > 0"));
        }

        let (tx, rx) = mpsc::channel(engine.event_channel_capacity);

        let reconciler = Self {
            provider,
            ip_source,
            ttl,
            concurrency: engine.concurrency,
            force_update_every: engine.force_update_every,
            caches: Mutex::new(HashMap::new()),
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Create a reconciler using the TTL and engine settings of a full configuration
    pub fn from_config(
        provider: Box<dyn ProviderAdapter>,
        ip_source: Box<dyn IpSource>,
        config: &DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        Self::new(provider, ip_source, config.effective_ttl(), &config.engine)
    }

    /// Name of the provider this reconciler writes to
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Run one pass over every domain, A first, then AAAA
    pub async fn run_pass(&self, domains: &mut DomainSet) -> PassReport {
        let started_at = Utc::now();
        StatusTracker::begin_pass(domains.domains_mut());

        let mut desired_values = Vec::new();
        let mut reports = Vec::new();

        for record_type in RecordType::ALL {
            if domains.eligible(record_type).is_empty() {
                continue;
            }
            let desired = self.desired_value(record_type).await;
            reports.extend(self.reconcile_type(&desired, domains).await);
            desired_values.push(desired);
        }

        let report = PassReport {
            started_at,
            finished_at: Utc::now(),
            desired: desired_values,
            domains: reports,
        };

        info!(
            "Pass finished: {} domain reconciliation(s), {} write(s), {} failure(s)",
            report.domains.len(),
            report.writes(),
            report.failures()
        );

        report
    }

    /// Fetch the desired value for a record type, gated by the IP cache
    ///
    /// Returns an empty value (skip) when the source has no address, the
    /// lookup failed, the address is of the wrong family, or the cache says
    /// the address has not changed.
    pub async fn desired_value(&self, record_type: RecordType) -> DesiredValue {
        let ip = match self.ip_source.current(record_type).await {
            Ok(Some(ip)) if record_type.matches(&ip) => ip.to_string(),
            Ok(Some(ip)) => {
                warn!(
                    "[{}] returned {} for {} records, skipping",
                    self.ip_source.source_name(),
                    ip,
                    record_type
                );
                return DesiredValue::skip(record_type);
            }
            Ok(None) => {
                debug!(
                    "[{}] no {} address available",
                    self.ip_source.source_name(),
                    record_type
                );
                return DesiredValue::skip(record_type);
            }
            Err(e) => {
                warn!("Failed to get {} address: {}", record_type, e);
                return DesiredValue::skip(record_type);
            }
        };

        let mut caches = self.caches.lock().await;
        let cache = caches
            .entry(record_type)
            .or_insert_with(|| IpCache::new(self.force_update_every));

        if cache.check(&ip) {
            DesiredValue::new(record_type, ip)
        } else {
            debug!("{} address {} unchanged, skipping", record_type, ip);
            DesiredValue::skip(record_type)
        }
    }

    /// Reconcile every domain managed for `desired.record_type`
    ///
    /// Statuses are updated after all domains have finished.
    pub async fn reconcile_type(
        &self,
        desired: &DesiredValue,
        domains: &mut DomainSet,
    ) -> Vec<DomainReport> {
        let record_type = desired.record_type;
        let eligible = domains.eligible(record_type);

        if desired.is_skip() {
            self.emit_event(EngineEvent::PassSkipped {
                record_type,
                domains: eligible.len(),
            });
            return eligible
                .iter()
                .map(|&i| {
                    DomainReport::new(
                        &domains.domains()[i],
                        record_type,
                        ReconciliationOutcome::Skipped,
                    )
                })
                .collect();
        }

        info!(
            "Reconciling {} domain(s) for {} -> {}",
            eligible.len(),
            record_type,
            desired.ip
        );
        self.emit_event(EngineEvent::PassStarted {
            record_type,
            ip: desired.ip.clone(),
        });

        let mut results: Vec<(usize, DomainReport)> = {
            let set: &DomainSet = domains;
            stream::iter(eligible)
                .map(|i| {
                    let domain = &set.domains()[i];
                    async move { (i, self.reconcile_domain(domain, desired).await) }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await
        };
        results.sort_by_key(|(i, _)| *i);

        let mut failed = 0;
        for (i, report) in &results {
            StatusTracker::apply(&mut domains.domains_mut()[*i], &report.outcome);
            if report.outcome.is_failure() {
                failed += 1;
            }
            self.emit_event(EngineEvent::DomainReconciled {
                domain: report.domain.clone(),
                record_type,
                outcome: report.outcome.clone(),
            });
        }

        if let Some(cache) = self.caches.lock().await.get_mut(&record_type) {
            cache.record_result(failed > 0);
        }

        self.emit_event(EngineEvent::PassFinished {
            record_type,
            succeeded: results.len() - failed,
            failed,
        });

        results.into_iter().map(|(_, report)| report).collect()
    }

    /// Reconcile one domain for one record type
    ///
    /// Never fails: every error becomes the returned outcome.
    pub async fn reconcile_domain(&self, domain: &Domain, desired: &DesiredValue) -> DomainReport {
        let record_type = desired.record_type;
        if desired.is_skip() {
            return DomainReport::new(domain, record_type, ReconciliationOutcome::Skipped);
        }

        let provider = self.provider.as_ref();

        let zone = match resolve_zone(provider, &domain.domain_name).await {
            Ok(zone) => zone,
            Err(Error::ZoneNotFound(root)) => {
                warn!(
                    "{}: root domain {} not found at {}",
                    domain,
                    root,
                    provider.provider_name()
                );
                return DomainReport::new(
                    domain,
                    record_type,
                    ReconciliationOutcome::ZoneNotFound(root),
                );
            }
            Err(e) => {
                error!("{}: zone lookup for {} failed: {}", domain, domain.domain_name, e);
                return DomainReport::new(
                    domain,
                    record_type,
                    ReconciliationOutcome::ZoneLookupFailed(e.to_string()),
                );
            }
        };

        let existing = match locate_records(provider, &zone, domain.host(), record_type).await {
            Ok(records) => records,
            Err(e) => {
                error!("{}: listing {} records failed: {}", domain, record_type, e);
                return DomainReport::new(
                    domain,
                    record_type,
                    ReconciliationOutcome::ListFailed(e.to_string()),
                );
            }
        };

        let wanted = DesiredRecord::for_domain(
            domain,
            record_type,
            &desired.ip,
            self.ttl,
            provider.default_line(),
        );

        let mut results = Vec::new();
        for action in decide(&wanted, existing) {
            results.push(self.apply_action(domain, &zone, action).await);
        }

        DomainReport {
            domain: domain.fqdn(),
            record_type,
            outcome: ReconciliationOutcome::from_actions(&results),
            actions: results,
        }
    }

    /// Carry out a single action against the provider
    async fn apply_action(&self, domain: &Domain, zone: &Zone, action: Action) -> ActionResult {
        let written = match &action {
            Action::NoOp(record) => {
                info!("{}: {} already {}", domain, record.record_type, record.value);
                return ActionResult::ok(action);
            }
            Action::Update { record, .. } => self.provider.update_record(zone, record).await,
            Action::Create(spec) => self.provider.create_record(zone, spec).await,
        };

        match written {
            Ok(WriteOutcome::Applied) => {
                info!(
                    "{}: {} at {}",
                    domain,
                    action.describe(),
                    self.provider.provider_name()
                );
                ActionResult::ok(action)
            }
            Ok(WriteOutcome::Rejected { message }) => {
                error!("{}: {} rejected: {}", domain, action.describe(), message);
                ActionResult::failed(action, message)
            }
            Err(e) => {
                error!("{}: {} failed: {}", domain, action.describe(), e);
                ActionResult::failed(action, e.to_string())
            }
        }
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        // A full channel drops the event rather than blocking the pass
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
