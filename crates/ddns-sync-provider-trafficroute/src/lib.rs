// # Volcengine TrafficRoute DNS Provider
//
// This crate provides a TrafficRoute adapter for the ddns-sync engine.
//
// ## Behavior
//
// - ✅ One signed HTTP request per adapter call
// - ✅ Shared HTTP client injected by the factory
// - ✅ `ResponseMetadata.Error` maps to vendor errors (reads) or rejections (writes)
// - ✅ Routing lines (`Line`) on create and update
// - ✅ Both A and AAAA records
// - ❌ NO retry or backoff
// - ❌ NO caching of zones or records
// - ❌ NO deletes
//
// ### Trust Level: Untrusted (Provider Adapter)
//
// See the `ProviderAdapter` trait docs in `ddns-sync-core`.
//
// ## Security Requirements
//
// - Secret access key NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if either credential is empty
//
// ## API Reference
//
// Every action is `https://open.volcengineapi.com/?Action=<name>&Version=2018-08-01`,
// signed with HMAC-SHA256 for service `DNS`.
//
// - ListZones: GET, `Key=<root domain>`
// - ListRecords: GET, `ZID`, `Host`, `Type`, `SearchMode=exact`
// - CreateRecord: POST JSON `{ZID, Host, Type, Line, TTL, Value}`
// - UpdateRecord: POST JSON `{RecordID, Host, Type, Line, TTL, Value}`

mod http;
mod sign;
mod types;

use async_trait::async_trait;
use ddns_sync_core::config::ProviderConfig;
use ddns_sync_core::traits::{
    ProviderAdapter, ProviderAdapterFactory, Record, RecordSpec, WriteOutcome, Zone,
};
use ddns_sync_core::{Error, RecordType, Result};
use reqwest::Method;

use crate::sign::Signer;
use crate::types::{
    CreateRecordBody, ListRecordsResult, ListZonesResult, TrafficRouteResponse, UpdateRecordBody,
    UpdateRecordResult,
};

/// Volcengine OpenAPI endpoint
pub const TRAFFIC_ROUTE_ENDPOINT: &str = "https://open.volcengineapi.com";

/// API version sent with every action
pub const TRAFFIC_ROUTE_VERSION: &str = "2018-08-01";

/// Service name in the signing scope
pub const TRAFFIC_ROUTE_SERVICE: &str = "DNS";

/// Signing region when none is configured
pub const TRAFFIC_ROUTE_REGION: &str = "cn-north-1";

/// Provider name used in errors and logs
const PROVIDER: &str = "trafficroute";

/// Line used when a domain does not choose one
const DEFAULT_LINE: &str = "default";

const CONTENT_TYPE: &str = "application/json";

/// Records fetched per ListRecords call
const PAGE_SIZE: &str = "500";

/// TrafficRoute provider adapter
///
/// # Trust Level: Untrusted
///
/// This adapter is isolated, stateless, and single-shot.
///
/// # Security
///
/// The Debug implementation does NOT expose the secret access key.
pub struct TrafficRouteProvider {
    signer: Signer,

    /// Shared HTTP client
    client: reqwest::Client,

    /// Endpoint without trailing slash
    endpoint: String,

    /// `host[:port]` of the endpoint, as signed
    host: String,
}

impl std::fmt::Debug for TrafficRouteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficRouteProvider")
            .field("signer", &self.signer)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl TrafficRouteProvider {
    /// Create a new TrafficRoute provider against the public endpoint
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: If either credential is empty
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();
        if access_key_id.is_empty() || secret_access_key.is_empty() {
            return Err(Error::config(
                "TrafficRoute access key id and secret access key are required",
            ));
        }

        let mut provider = Self {
            signer: Signer::new(access_key_id, secret_access_key, TRAFFIC_ROUTE_REGION),
            client,
            endpoint: String::new(),
            host: String::new(),
        };
        provider.set_endpoint(TRAFFIC_ROUTE_ENDPOINT)?;
        Ok(provider)
    }

    /// Sign for another region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        let region = region.into();
        if !region.is_empty() {
            self.signer = self.signer.with_region(region);
        }
        self
    }

    /// Point the adapter at another endpoint
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: If the endpoint is not an absolute URL with a
    ///   host, or carries a path or query
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.set_endpoint(endpoint)?;
        Ok(self)
    }

    /// Region used in the signing scope
    pub fn region(&self) -> &str {
        self.signer.region()
    }

    fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| Error::config(format!("invalid TrafficRoute endpoint {endpoint:?}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::config(format!("TrafficRoute endpoint {endpoint:?} has no host")))?;
        // Requests are signed for the canonical URI `/`
        if url.path() != "/" || url.query().is_some() {
            return Err(Error::config(format!(
                "TrafficRoute endpoint {endpoint:?} must not carry a path or query"
            )));
        }

        self.host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        Ok(())
    }

    /// Interpret a write response
    fn write_outcome(
        action: &str,
        response: TrafficRouteResponse<UpdateRecordResult>,
    ) -> WriteOutcome {
        if let Some(error) = response.api_error() {
            return WriteOutcome::Rejected {
                message: format!("[{}] {}", error.code, error.message),
            };
        }
        match response.result.and_then(|r| r.status) {
            Some(false) => WriteOutcome::Rejected {
                message: format!("{action} returned Status=false"),
            },
            _ => WriteOutcome::Applied,
        }
    }
}

#[async_trait]
impl ProviderAdapter for TrafficRouteProvider {
    async fn list_zones(&self, root_domain: &str) -> Result<Vec<Zone>> {
        let result: ListZonesResult = self.read("ListZones", &[("Key", root_domain)]).await?;

        tracing::debug!(
            provider = PROVIDER,
            root = root_domain,
            total = result.total,
            "listed zones"
        );

        Ok(result
            .zones
            .into_iter()
            .filter(|z| z.zone_name.eq_ignore_ascii_case(root_domain))
            .map(|z| {
                tracing::trace!(zid = z.zid, records = z.record_count, "zone matched");
                Zone::new(z.zid.to_string(), z.zone_name)
            })
            .collect())
    }

    async fn list_records(
        &self,
        zone: &Zone,
        host: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>> {
        let result: ListRecordsResult = self
            .read(
                "ListRecords",
                &[
                    ("ZID", zone.id.as_str()),
                    ("Host", host),
                    ("Type", record_type.as_str()),
                    ("SearchMode", "exact"),
                    ("PageSize", PAGE_SIZE),
                ],
            )
            .await?;

        let records = result
            .records
            .ok_or_else(|| Error::decode(PROVIDER, "ListRecords response has no Records"))?;

        if result.total_count > records.len() as u64 {
            tracing::warn!(
                provider = PROVIDER,
                zone = %zone.name,
                host,
                total = result.total_count,
                returned = records.len(),
                "ListRecords was truncated"
            );
        }

        Ok(records
            .into_iter()
            .filter(|r| r.host == host)
            .filter(|r| RecordType::parse(&r.record_type) == Some(record_type))
            .map(|r| Record {
                id: r.record_id,
                host: r.host,
                record_type,
                line: r.line,
                ttl: r.ttl,
                value: r.value,
            })
            .collect())
    }

    async fn create_record(&self, zone: &Zone, spec: &RecordSpec) -> Result<WriteOutcome> {
        let zid = zone.id.parse::<u64>().map_err(|_| {
            Error::invalid_input(format!("TrafficRoute zone id {:?} is not numeric", zone.id))
        })?;
        let body = CreateRecordBody {
            zid,
            host: &spec.host,
            record_type: spec.record_type.as_str(),
            line: &spec.line,
            ttl: spec.ttl,
            value: &spec.value,
        };

        let response = self
            .call(Method::POST, "CreateRecord", &[], serde_json::to_string(&body)?)
            .await?;
        Ok(Self::write_outcome("CreateRecord", response))
    }

    async fn update_record(&self, _zone: &Zone, record: &Record) -> Result<WriteOutcome> {
        let body = UpdateRecordBody {
            record_id: &record.id,
            host: &record.host,
            record_type: record.record_type.as_str(),
            line: &record.line,
            ttl: record.ttl,
            value: &record.value,
        };

        let response = self
            .call(Method::POST, "UpdateRecord", &[], serde_json::to_string(&body)?)
            .await?;
        Ok(Self::write_outcome("UpdateRecord", response))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn default_line(&self) -> &'static str {
        DEFAULT_LINE
    }
}

/// Factory for creating TrafficRoute providers
pub struct TrafficRouteFactory;

impl ProviderAdapterFactory for TrafficRouteFactory {
    fn create(
        &self,
        config: &ProviderConfig,
        client: reqwest::Client,
    ) -> Result<Box<dyn ProviderAdapter>> {
        match config {
            ProviderConfig::TrafficRoute {
                access_key_id,
                secret_access_key,
                region,
                endpoint,
            } => {
                let mut provider =
                    TrafficRouteProvider::new(access_key_id.clone(), secret_access_key.clone(), client)?;
                if let Some(region) = region {
                    provider = provider.with_region(region.clone());
                }
                if let Some(endpoint) = endpoint {
                    provider = provider.with_endpoint(endpoint)?;
                }
                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for TrafficRoute provider")),
        }
    }
}

/// Register the TrafficRoute provider with a registry
///
/// # Example
///
/// ```rust
/// use ddns_sync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// ddns_sync_provider_trafficroute::register(&registry);
/// assert!(registry.has_provider("traffic_route"));
/// ```
pub fn register(registry: &ddns_sync_core::ProviderRegistry) {
    registry.register_provider("traffic_route", Box::new(TrafficRouteFactory));
}
