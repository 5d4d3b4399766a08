//! Plugin-based provider registry
//!
//! The registry allows provider adapters and IP sources to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ddns_sync_core::registry::ProviderRegistry;
//! use ddns_sync_core::transport::build_http_client;
//!
//! let registry = ProviderRegistry::new();
//! ddns_sync_provider_trafficroute::register(&registry);
//!
//! let client = build_http_client(&config.transport)?;
//! let provider = registry.create_provider(&config.provider, client.clone())?;
//! ```
//!
//! ## Registration
//!
//! Implementations register themselves under their config type name:
//!
//! ```rust,ignore
//! // In ddns-sync-provider-cloudflare crate
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("cloudflare", Box::new(CloudflareFactory));
//! }
//! ```

use crate::config::{IpSourceConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::traits::{IpSource, IpSourceFactory, ProviderAdapter, ProviderAdapterFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry for plugin-based provider and IP source creation
///
/// The registry maintains a map of type names to factory objects,
/// allowing dynamic instantiation based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered provider adapter factories
    providers: RwLock<HashMap<String, Box<dyn ProviderAdapterFactory>>>,

    /// Registered IP source factories
    ip_sources: RwLock<HashMap<String, Box<dyn IpSourceFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider adapter factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "traffic_route", "cloudflare")
    /// - `factory`: Factory object for creating adapter instances
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ProviderAdapterFactory>,
    ) {
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Register an IP source factory
    ///
    /// # Parameters
    ///
    /// - `name`: IP source type name (e.g., "http")
    /// - `factory`: Factory object for creating IP source instances
    pub fn register_ip_source(&self, name: impl Into<String>, factory: Box<dyn IpSourceFactory>) {
        self.ip_sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Create a provider adapter from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Provider configuration
    /// - `client`: The shared HTTP client
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ProviderAdapter>)`: Created adapter instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_provider(
        &self,
        config: &ProviderConfig,
        client: reqwest::Client,
    ) -> Result<Box<dyn ProviderAdapter>> {
        let provider_type = config.type_name();
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config, client)
    }

    /// Create an IP source from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: IP source configuration
    /// - `client`: The shared HTTP client
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn IpSource>)`: Created IP source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_ip_source(
        &self,
        config: &IpSourceConfig,
        client: reqwest::Client,
    ) -> Result<Box<dyn IpSource>> {
        let source_type = config.type_name();
        let sources = self.ip_sources.read().unwrap_or_else(PoisonError::into_inner);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown IP source type: {}", source_type)))?;

        factory.create(config, client)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// List all registered IP source types
    pub fn list_ip_sources(&self) -> Vec<String> {
        let sources = self.ip_sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }

    /// Check if an IP source type is registered
    pub fn has_ip_source(&self, name: &str) -> bool {
        let sources = self.ip_sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }
}
