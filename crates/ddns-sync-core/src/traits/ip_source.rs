// # IP Source Trait
//
// Defines the interface for looking up the current public address.
//
// ## Implementations
//
// - HTTP echo services: `ddns-sync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_sync_core::{IpSource, RecordType};
//
// async fn show(source: &dyn IpSource) -> ddns_sync_core::Result<()> {
//     if let Some(ip) = source.current(RecordType::A).await? {
//         println!("public IPv4: {}", ip);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::domain::RecordType;

/// Trait for IP source implementations
///
/// The engine asks once per record type at the start of each pass.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Query external echo services through the injected client
/// - ✅ Read local interface state
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `ProviderAdapter`)
/// - ❌ Decide whether a pass runs (owned by the engine's IP cache)
/// - ❌ Spawn background tasks
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current address for `record_type`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ip))`: The current address, of the matching family
    /// - `Ok(None)`: No address of this family is configured or available
    /// - `Err(Error)`: Every lookup failed
    async fn current(&self, record_type: RecordType) -> crate::Result<Option<IpAddr>>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing IP sources from configuration
pub trait IpSourceFactory: Send + Sync {
    /// Create an IpSource instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this IP source type
    /// - `client`: The shared HTTP client
    fn create(
        &self,
        config: &crate::config::IpSourceConfig,
        client: reqwest::Client,
    ) -> crate::Result<Box<dyn IpSource>>;
}
