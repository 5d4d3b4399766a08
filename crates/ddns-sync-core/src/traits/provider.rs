// # Provider Adapter Trait
//
// Defines the narrow interface the engine uses to talk to a DNS vendor.
//
// ## Implementations
//
// - Volcengine TrafficRoute: `ddns-sync-provider-trafficroute` crate
// - Cloudflare: `ddns-sync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_sync_core::{ProviderAdapter, RecordType};
//
// async fn show(adapter: &dyn ProviderAdapter) -> ddns_sync_core::Result<()> {
//     let zones = adapter.list_zones("example.com").await?;
//     if let Some(zone) = zones.first() {
//         let records = adapter.list_records(zone, "home", RecordType::A).await?;
//         println!("{} record(s)", records.len());
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::domain::RecordType;

/// Provider-side hosting zone for a root domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider-assigned zone identifier
    pub id: String,
    /// Zone name as reported by the provider
    pub name: String,
}

impl Zone {
    /// Create a zone handle
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An existing DNS record at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Provider-assigned record identifier
    pub id: String,
    /// Host label relative to the zone (`@` for the apex)
    pub host: String,
    /// Record type
    pub record_type: RecordType,
    /// Routing line
    pub line: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record value (the address)
    pub value: String,
}

/// A record to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    /// Host label relative to the zone (`@` for the apex)
    pub host: String,
    /// Record type
    pub record_type: RecordType,
    /// Routing line
    pub line: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record value (the address)
    pub value: String,
}

/// Result of a write the provider answered
///
/// Transport and decode failures are `Err`; a decoded response that says
/// the write did not happen is [`WriteOutcome::Rejected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The provider applied the write
    Applied,
    /// The provider answered but refused the write
    Rejected {
        /// Provider message, verbatim
        message: String,
    },
}

impl WriteOutcome {
    /// Whether the write was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied)
    }
}

/// Trait for DNS provider adapters
///
/// Adapters translate four operations into vendor API calls. They decide
/// nothing: the engine owns lookups, decisions and status.
///
/// # Thread Safety
///
/// Implementations must be thread-safe; the engine calls them from several
/// domains concurrently.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS calls to their own endpoint through the injected client
/// - ✅ Sign requests with their own credentials
/// - ✅ Decode vendor envelopes and map vendor errors
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (a failed call is reported once)
/// - ❌ Cache zones or records between calls
/// - ❌ Decide whether a record needs a write
/// - ❌ Delete records
/// - ❌ Log credentials or signatures
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Find hosting zones whose name equals `root_domain`
    ///
    /// # Returns
    ///
    /// - `Ok(vec![])`: The provider hosts no such zone
    /// - `Err(Error)`: Transport, decode or vendor failure
    async fn list_zones(&self, root_domain: &str) -> crate::Result<Vec<Zone>>;

    /// List records of `record_type` whose host exactly equals `host`
    ///
    /// An empty vector is a valid answer and means "no such record".
    async fn list_records(
        &self,
        zone: &Zone,
        host: &str,
        record_type: RecordType,
    ) -> crate::Result<Vec<Record>>;

    /// Create a record in `zone`
    async fn create_record(&self, zone: &Zone, spec: &RecordSpec) -> crate::Result<WriteOutcome>;

    /// Update an existing record in `zone`, identified by `record.id`
    async fn update_record(&self, zone: &Zone, record: &Record) -> crate::Result<WriteOutcome>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Routing line used when a domain does not configure one
    fn default_line(&self) -> &'static str {
        "default"
    }
}

/// Helper trait for constructing provider adapters from configuration
pub trait ProviderAdapterFactory: Send + Sync {
    /// Create a ProviderAdapter instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    /// - `client`: The shared HTTP client
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
        client: reqwest::Client,
    ) -> crate::Result<Box<dyn ProviderAdapter>>;
}
