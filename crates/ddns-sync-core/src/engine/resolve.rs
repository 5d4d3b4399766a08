//! Zone resolution and record location
//!
//! Thin lookups on top of the adapter. Neither caches: every pass asks the
//! provider again.

use tracing::debug;

use crate::domain::RecordType;
use crate::error::{Error, Result};
use crate::traits::{ProviderAdapter, Record, Zone};

/// Find the zone hosting `root_domain`
///
/// The first zone the provider returns wins.
///
/// # Returns
///
/// - `Ok(Zone)`: The hosting zone
/// - `Err(Error::ZoneNotFound)`: The provider returned no zone
/// - `Err(Error)`: The lookup itself failed
pub async fn resolve_zone(adapter: &dyn ProviderAdapter, root_domain: &str) -> Result<Zone> {
    let zones = adapter.list_zones(root_domain).await?;
    if zones.len() > 1 {
        debug!(
            "[{}] {} zones match {}, using {}",
            adapter.provider_name(),
            zones.len(),
            root_domain,
            zones[0].id
        );
    }

    zones
        .into_iter()
        .next()
        .ok_or_else(|| Error::ZoneNotFound(root_domain.to_string()))
}

/// List the records of `record_type` at `host` in `zone`
///
/// An empty result is valid and means the record does not exist yet.
pub async fn locate_records(
    adapter: &dyn ProviderAdapter,
    zone: &Zone,
    host: &str,
    record_type: RecordType,
) -> Result<Vec<Record>> {
    let records = adapter.list_records(zone, host, record_type).await?;
    debug!(
        "[{}] {} {} record(s) at {} in zone {}",
        adapter.provider_name(),
        records.len(),
        record_type,
        host,
        zone.name
    );
    Ok(records)
}
