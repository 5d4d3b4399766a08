// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the ddns-sync engine.
//
// ## Architecture
//
// Asks plain-text echo services (e.g. api.ipify.org, icanhazip.com) for the
// public address, one URL list per address family. URLs are tried in order
// and the first answer of the right family wins.
//
// No polling and no caching: the engine asks once per record type per pass,
// and the engine's IP cache decides whether the answer triggers work.

use async_trait::async_trait;
use ddns_sync_core::config::IpSourceConfig;
use ddns_sync_core::traits::{IpSource, IpSourceFactory};
use ddns_sync_core::{Error, ProviderRegistry, RecordType, Result, transport};
use std::net::IpAddr;

/// Source name used in logs
const SOURCE: &str = "http";

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    client: reqwest::Client,
    ipv4_urls: Vec<String>,
    ipv6_urls: Vec<String>,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `ipv4_urls`: Services asked for `A` records, in order
    /// - `ipv6_urls`: Services asked for `AAAA` records, in order
    /// - `client`: The shared HTTP client (timeouts come from it)
    pub fn new(ipv4_urls: Vec<String>, ipv6_urls: Vec<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            ipv4_urls,
            ipv6_urls,
        }
    }

    fn urls(&self, record_type: RecordType) -> &[String] {
        match record_type {
            RecordType::A => &self.ipv4_urls,
            RecordType::Aaaa => &self.ipv6_urls,
        }
    }

    /// Ask a single service
    async fn lookup(&self, url: &str, record_type: RecordType) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("{url}: request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(Error::ip_source(format!(
                "{url}: HTTP {}: {}",
                status.as_u16(),
                transport::excerpt(&body)
            )));
        }

        parse_address(body.trim(), record_type)
            .map_err(|e| Error::ip_source(format!("{url}: {e}")))
    }
}

/// Parse an echo-service answer, requiring the family of `record_type`
fn parse_address(text: &str, record_type: RecordType) -> std::result::Result<IpAddr, String> {
    let ip: IpAddr = text
        .parse()
        .map_err(|_| format!("not an IP address: {:?}", transport::excerpt(text)))?;

    if !record_type.matches(&ip) {
        return Err(format!("expected {} address, got {}", record_type, ip));
    }
    Ok(ip)
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, record_type: RecordType) -> Result<Option<IpAddr>> {
        let urls = self.urls(record_type);
        if urls.is_empty() {
            return Ok(None);
        }

        let mut last_error = None;
        for url in urls {
            match self.lookup(url, record_type).await {
                Ok(ip) => {
                    tracing::debug!(source = SOURCE, %record_type, url = %url, %ip, "public address");
                    return Ok(Some(ip));
                }
                Err(e) => {
                    tracing::warn!(source = SOURCE, %record_type, "lookup failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(Error::ip_source(format!(
            "all {} {} lookups failed; last: {}",
            urls.len(),
            record_type,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn source_name(&self) -> &'static str {
        SOURCE
    }
}

/// Factory for creating HTTP IP sources
pub struct HttpFactory;

impl IpSourceFactory for HttpFactory {
    fn create(&self, config: &IpSourceConfig, client: reqwest::Client) -> Result<Box<dyn IpSource>> {
        match config {
            IpSourceConfig::Http {
                ipv4_urls,
                ipv6_urls,
            } => Ok(Box::new(HttpIpSource::new(
                ipv4_urls.clone(),
                ipv6_urls.clone(),
                client,
            ))),
            _ => Err(Error::config("Invalid config for HTTP IP source")),
        }
    }
}

/// Register the HTTP IP source with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_ip_source("http", Box::new(HttpFactory));
}
