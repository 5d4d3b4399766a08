//! Configuration types for the DDNS sync engine
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::DomainSet;

/// TTL applied when none is configured or the configured one is unusable
pub const DEFAULT_TTL: u32 = 600;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Domains to manage, per address family
    #[serde(default)]
    pub domains: DomainsConfig,

    /// TTL for written records, number or string
    #[serde(default)]
    pub ttl: Option<TtlSetting>,

    /// Shared HTTP client settings
    #[serde(default)]
    pub transport: TransportConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration for a provider with every other setting at its default
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            ip_source: IpSourceConfig::default(),
            domains: DomainsConfig::default(),
            ttl: None,
            transport: TransportConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: DdnsConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        self.provider.validate()?;
        self.ip_source.validate()?;
        self.engine.validate()?;
        self.domains.to_domain_set()?;

        Ok(())
    }

    /// Effective TTL: the configured value, or [`DEFAULT_TTL`] if unset, zero or unparsable
    pub fn effective_ttl(&self) -> u32 {
        self.ttl.as_ref().and_then(TtlSetting::seconds).unwrap_or(DEFAULT_TTL)
    }
}

/// TTL as written in configuration
///
/// Accepts `600` as well as `"600"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TtlSetting {
    /// Numeric TTL
    Seconds(u64),
    /// TTL given as text
    Text(String),
}

impl TtlSetting {
    /// Usable TTL in seconds, `None` when zero, out of range or unparsable
    pub fn seconds(&self) -> Option<u32> {
        let value = match self {
            TtlSetting::Seconds(secs) => *secs,
            TtlSetting::Text(text) => text.trim().parse::<u64>().ok()?,
        };
        u32::try_from(value).ok().filter(|v| *v > 0)
    }
}

/// Managed domains in the `sub.example.com?Line=x` notation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainsConfig {
    /// Domains receiving A records
    #[serde(default)]
    pub ipv4: Vec<String>,

    /// Domains receiving AAAA records
    #[serde(default)]
    pub ipv6: Vec<String>,
}

impl DomainsConfig {
    /// Whether no domain is configured for either family
    pub fn is_empty(&self) -> bool {
        self.ipv4.iter().chain(self.ipv6.iter()).all(|d| d.trim().is_empty())
    }

    /// Parse both lists into the engine's domain set
    pub fn to_domain_set(&self) -> Result<DomainSet, crate::Error> {
        DomainSet::from_lists(&self.ipv4, &self.ipv6)
    }
}

/// IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpSourceConfig {
    /// HTTP echo services, tried in order until one answers
    Http {
        /// Services returning the public IPv4 address
        #[serde(default = "default_ipv4_urls")]
        ipv4_urls: Vec<String>,
        /// Services returning the public IPv6 address
        #[serde(default = "default_ipv6_urls")]
        ipv6_urls: Vec<String>,
    },

    /// Custom IP source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            IpSourceConfig::Http {
                ipv4_urls,
                ipv6_urls,
            } => {
                if ipv4_urls.is_empty() && ipv6_urls.is_empty() {
                    return Err(crate::Error::config(
                        "HTTP IP source needs at least one URL",
                    ));
                }
                if let Some(bad) = ipv4_urls
                    .iter()
                    .chain(ipv6_urls.iter())
                    .find(|u| !u.starts_with("http://") && !u.starts_with("https://"))
                {
                    return Err(crate::Error::config(format!(
                        "HTTP IP source URL must be http(s): {}",
                        bad
                    )));
                }
                Ok(())
            }
            IpSourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom IP source factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom IP source config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the IP source type name
    pub fn type_name(&self) -> &str {
        match self {
            IpSourceConfig::Http { .. } => "http",
            IpSourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        IpSourceConfig::Http {
            ipv4_urls: default_ipv4_urls(),
            ipv6_urls: default_ipv6_urls(),
        }
    }
}

fn default_ipv4_urls() -> Vec<String> {
    vec![
        "https://api.ipify.org".to_string(),
        "https://4.ipw.cn".to_string(),
        "https://ipv4.icanhazip.com".to_string(),
    ]
}

fn default_ipv6_urls() -> Vec<String> {
    vec![
        "https://api6.ipify.org".to_string(),
        "https://6.ipw.cn".to_string(),
        "https://ipv6.icanhazip.com".to_string(),
    ]
}

/// DNS provider configuration
///
/// `Debug` redacts every credential.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Volcengine TrafficRoute DNS
    TrafficRoute {
        /// Access key ID
        access_key_id: String,
        /// Secret access key
        secret_access_key: String,
        /// Signing region (defaults to `cn-north-1`)
        #[serde(default)]
        region: Option<String>,
        /// API endpoint override
        #[serde(default)]
        endpoint: Option<String>,
    },

    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

// Custom Debug implementation that hides credentials
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::TrafficRoute {
                access_key_id,
                region,
                endpoint,
                ..
            } => f
                .debug_struct("TrafficRoute")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<REDACTED>")
                .field("region", region)
                .field("endpoint", endpoint)
                .finish(),
            ProviderConfig::Cloudflare { .. } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::TrafficRoute {
                access_key_id,
                secret_access_key,
                ..
            } => {
                if access_key_id.is_empty() || secret_access_key.is_empty() {
                    return Err(crate::Error::config(
                        "TrafficRoute access key ID and secret cannot be empty",
                    ));
                }
                Ok(())
            }
            ProviderConfig::Cloudflare { api_token } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::TrafficRoute { .. } => "traffic_route",
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Total request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout (in seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Idle connections kept per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// How long an idle connection is kept (in seconds)
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_pool_max_idle_per_host() -> usize {
    8
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between passes when running as a daemon
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum number of domains reconciled at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Unchanged passes after which a record type is reconciled anyway
    ///
    /// Set to 0 to only reconcile on IP change or after a failure.
    #[serde(default = "default_force_update_every")]
    pub force_update_every: u32,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Engine interval must be > 0"));
        }
        if self.concurrency == 0 {
            return Err(crate::Error::config("Engine concurrency must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            concurrency: default_concurrency(),
            force_update_every: default_force_update_every(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_concurrency() -> usize {
    4
}

fn default_force_update_every() -> u32 {
    6
}

fn default_event_channel_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloudflare() -> ProviderConfig {
        ProviderConfig::Cloudflare {
            api_token: "token".to_string(),
        }
    }

    #[test]
    fn ttl_falls_back_to_default() {
        let mut config = DdnsConfig::new(cloudflare());
        assert_eq!(config.effective_ttl(), 600);

        config.ttl = Some(TtlSetting::Seconds(0));
        assert_eq!(config.effective_ttl(), 600);

        config.ttl = Some(TtlSetting::Text("ten".to_string()));
        assert_eq!(config.effective_ttl(), 600);

        config.ttl = Some(TtlSetting::Text(" 120 ".to_string()));
        assert_eq!(config.effective_ttl(), 120);

        config.ttl = Some(TtlSetting::Seconds(60));
        assert_eq!(config.effective_ttl(), 60);
    }

    #[test]
    fn provider_config_is_tagged_by_type() {
        let json = r#"{
            "type": "traffic_route",
            "access_key_id": "AK",
            "secret_access_key": "SK"
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.type_name(), "traffic_route");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn credentials_not_exposed_in_debug() {
        let traffic_route = DdnsConfig::new(ProviderConfig::TrafficRoute {
            access_key_id: "AKLT-visible".to_string(),
            secret_access_key: "super-secret-key".to_string(),
            region: None,
            endpoint: None,
        });
        let debug = format!("{:?}", traffic_route);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("AKLT-visible"));
        assert!(debug.contains("<REDACTED>"));

        let cloudflare = DdnsConfig::new(ProviderConfig::Cloudflare {
            api_token: "cf-secret-token".to_string(),
        });
        assert!(!format!("{:?}", cloudflare).contains("cf-secret-token"));

        let custom = ProviderConfig::Custom {
            factory: "acme".to_string(),
            config: serde_json::json!({ "password": "hunter2" }),
        };
        let debug = format!("{:?}", custom);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("acme"));
    }

    #[test]
    fn empty_credentials_fail_validation() {
        let config = ProviderConfig::TrafficRoute {
            access_key_id: "AK".to_string(),
            secret_access_key: String::new(),
            region: None,
            endpoint: None,
        };
        assert!(config.validate().is_err());
        assert!(ProviderConfig::Cloudflare { api_token: String::new() }.validate().is_err());
    }

    #[test]
    fn validate_requires_domains() {
        let mut config = DdnsConfig::new(cloudflare());
        assert!(config.validate().is_err());

        config.domains.ipv4.push("home.example.com".to_string());
        assert!(config.validate().is_ok());

        config.domains.ipv6.push("nodot".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.interval_secs, 300);
        assert_eq!(engine.concurrency, 4);
        assert_eq!(engine.force_update_every, 6);

        let zero = EngineConfig {
            concurrency: 0,
            ..EngineConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn http_ip_source_rejects_non_http_urls() {
        let config = IpSourceConfig::Http {
            ipv4_urls: vec!["ftp://example.com".to_string()],
            ipv6_urls: vec![],
        };
        assert!(config.validate().is_err());
        assert!(IpSourceConfig::default().validate().is_ok());
    }
}
