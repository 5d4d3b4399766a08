// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare adapter for the ddns-sync engine.
//
// ## Behavior
//
// - ✅ One HTTP request per adapter call
// - ✅ Shared HTTP client injected by the factory (timeouts and pool are process-wide)
// - ✅ Explicit `success: false` envelopes map to vendor errors (reads) or rejections (writes)
// - ✅ Both A and AAAA records
// - ❌ NO retry or backoff (a failure is reported once)
// - ❌ NO caching of zones or records
// - ❌ NO deletes
//
// ### Trust Level: Untrusted (Provider Adapter)
//
// See the `ProviderAdapter` trait docs in `ddns-sync-core`.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`
//
// Cloudflare has no routing lines; every record reports the `default` line.

use async_trait::async_trait;
use ddns_sync_core::config::ProviderConfig;
use ddns_sync_core::traits::{
    ProviderAdapter, ProviderAdapterFactory, Record, RecordSpec, WriteOutcome, Zone,
};
use ddns_sync_core::{Error, RecordType, Result, transport};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Provider name used in errors and logs
const PROVIDER: &str = "cloudflare";

/// Line reported for every Cloudflare record
const CLOUDFLARE_LINE: &str = "default";

/// Cloudflare API v4 response envelope
#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<CloudflareError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    code: i64,
    message: String,
}

impl<T> CloudflareResponse<T> {
    /// All errors as `[code] message`, joined
    fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "request was not successful".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("[{}] {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Unwrap a read response, mapping `success: false` to a vendor error
    fn into_result(self) -> Result<T> {
        if !self.success {
            let (code, message) = match self.errors.first() {
                Some(first) => (first.code.to_string(), self.error_summary()),
                None => ("unknown".to_string(), self.error_summary()),
            };
            return Err(Error::vendor(PROVIDER, code, message));
        }
        self.result
            .ok_or_else(|| Error::decode(PROVIDER, "response has no result"))
    }

    /// Interpret a write response
    fn into_write_outcome(self) -> WriteOutcome {
        if self.success {
            WriteOutcome::Applied
        } else {
            WriteOutcome::Rejected {
                message: self.error_summary(),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CloudflareZone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CloudflareDnsRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    #[serde(default)]
    ttl: u32,
}

/// Body of create and update requests
#[derive(Debug, Serialize)]
struct RecordPayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: String,
    content: &'a str,
    ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxied: Option<bool>,
}

/// Cloudflare provider adapter
///
/// # Trust Level: Untrusted
///
/// This adapter is isolated, stateless, and single-shot.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Shared HTTP client
    client: reqwest::Client,

    /// API base URL
    base_url: String,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `client`: The shared HTTP client
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: If the token is empty
    pub fn new(api_token: impl Into<String>, client: reqwest::Client) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        Ok(Self {
            api_token,
            client,
            base_url: CLOUDFLARE_API_BASE.to_string(),
        })
    }

    /// Point the adapter at another API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send an authenticated request and decode the envelope
    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<CloudflareResponse<T>> {
        let request = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json");
        let raw = transport::execute(PROVIDER, action, request).await?;
        transport::decode(PROVIDER, &raw)
    }

    fn records_url(&self, zone: &Zone) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone.id)
    }
}

#[async_trait]
impl ProviderAdapter for CloudflareProvider {
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn list_zones(&self, root_domain: &str) -> Result<Vec<Zone>> {
        let request = self
            .client
            .get(format!("{}/zones", self.base_url))
            .query(&[("name", root_domain)]);

        let zones: Vec<CloudflareZone> = self.call("ListZones", request).await?.into_result()?;

        Ok(zones
            .into_iter()
            .filter(|z| z.name.eq_ignore_ascii_case(root_domain))
            .map(|z| Zone::new(z.id, z.name))
            .collect())
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(
        &self,
        zone: &Zone,
        host: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>> {
        let fqdn = relative_to_full_name(host, &zone.name);
        let request = self
            .client
            .get(self.records_url(zone))
            .query(&[("type", record_type.as_str()), ("name", fqdn.as_str())]);

        let records: Vec<CloudflareDnsRecord> =
            self.call("ListRecords", request).await?.into_result()?;

        Ok(records
            .into_iter()
            .filter(|r| r.name.eq_ignore_ascii_case(&fqdn))
            .filter(|r| RecordType::parse(&r.record_type) == Some(record_type))
            .map(|r| Record {
                id: r.id,
                host: full_name_to_relative(&r.name, &zone.name),
                record_type,
                line: CLOUDFLARE_LINE.to_string(),
                ttl: r.ttl,
                value: r.content,
            })
            .collect())
    }

    async fn create_record(&self, zone: &Zone, spec: &RecordSpec) -> Result<WriteOutcome> {
        let payload = RecordPayload {
            record_type: spec.record_type.as_str(),
            name: relative_to_full_name(&spec.host, &zone.name),
            content: &spec.value,
            ttl: spec.ttl,
            proxied: Some(false),
        };
        let request = self.client.post(self.records_url(zone)).json(&payload);

        let response: CloudflareResponse<serde_json::Value> =
            self.call("CreateRecord", request).await?;
        Ok(response.into_write_outcome())
    }

    async fn update_record(&self, zone: &Zone, record: &Record) -> Result<WriteOutcome> {
        let payload = RecordPayload {
            record_type: record.record_type.as_str(),
            name: relative_to_full_name(&record.host, &zone.name),
            content: &record.value,
            ttl: record.ttl,
            proxied: None,
        };
        let request = self
            .client
            .patch(format!("{}/{}", self.records_url(zone), record.id))
            .json(&payload);

        let response: CloudflareResponse<serde_json::Value> =
            self.call("UpdateRecord", request).await?;
        Ok(response.into_write_outcome())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn default_line(&self) -> &'static str {
        CLOUDFLARE_LINE
    }
}

/// "www.example.com" in "example.com" → "www"; the apex → "@"
fn full_name_to_relative(full_name: &str, zone_name: &str) -> String {
    let full = full_name.trim_end_matches('.');
    let zone = zone_name.trim_end_matches('.');

    if full.eq_ignore_ascii_case(zone) {
        "@".to_string()
    } else if let Some(sub) = full.strip_suffix(&format!(".{}", zone)) {
        sub.to_string()
    } else {
        full.to_string()
    }
}

/// "www" in "example.com" → "www.example.com"; "@" → the zone itself
fn relative_to_full_name(host: &str, zone_name: &str) -> String {
    let zone = zone_name.trim_end_matches('.');
    if host == "@" || host.is_empty() {
        zone.to_string()
    } else {
        format!("{}.{}", host, zone)
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl ProviderAdapterFactory for CloudflareFactory {
    fn create(
        &self,
        config: &ProviderConfig,
        client: reqwest::Client,
    ) -> Result<Box<dyn ProviderAdapter>> {
        match config {
            ProviderConfig::Cloudflare { api_token } => {
                Ok(Box::new(CloudflareProvider::new(api_token.clone(), client)?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use ddns_sync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// ddns_sync_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ddns_sync_core::ProviderRegistry) {
    registry.register_provider("cloudflare", Box::new(CloudflareFactory));
}
