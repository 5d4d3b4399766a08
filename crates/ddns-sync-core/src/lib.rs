// # ddns-sync-core
//
// Core library for the DDNS sync engine.
//
// ## Architecture Overview
//
// This library keeps A/AAAA records at a DNS vendor in line with the host's
// public address:
// - **ProviderAdapter**: Trait for listing zones/records and writing records at a vendor
// - **IpSource**: Trait for looking up the current public address per record type
// - **Reconciler**: Engine running passes over the managed domains
// - **decide**: Pure decision from desired value and existing records to actions
// - **StatusTracker**: Sole writer of per-domain update status
// - **ProviderRegistry**: Plugin-based registry for adapters and IP sources
//
// ## Design Principles
//
// 1. **Converge, never delete**: Records are created or updated, never removed
// 2. **Failure is local**: One domain's failure never stops the others
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: A second pass with the same address writes nothing

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ip_cache;
pub mod registry;
pub mod traits;
pub mod transport;

// Re-export core types for convenience
pub use config::{DdnsConfig, EngineConfig, IpSourceConfig, ProviderConfig, TransportConfig};
pub use domain::{DesiredValue, Domain, DomainSet, RecordType, UpdateStatus};
pub use engine::{
    Action, DomainReport, EngineEvent, PassReport, ReconciliationOutcome, Reconciler,
    StatusTracker, decide,
};
pub use error::{Error, Result};
pub use ip_cache::IpCache;
pub use registry::ProviderRegistry;
pub use traits::{
    IpSource, IpSourceFactory, ProviderAdapter, ProviderAdapterFactory, Record, RecordSpec,
    WriteOutcome, Zone,
};
