// # ddns-syncd - DDNS Sync Daemon
//
// Thin integration layer: reads configuration, sets up tracing, registers
// the built-in adapters, and runs reconciliation passes on an interval.
// All DNS logic lives in ddns-sync-core and the adapter crates.
//
// ## Configuration
//
// Either a JSON file (`DDNS_CONFIG=/etc/ddns-sync.json`) or environment
// variables. Variables below override the file when both are present.
//
// ### DNS Provider
// - `DDNS_PROVIDER_TYPE`: `traffic_route` (default) or `cloudflare`
// - `DDNS_PROVIDER_ACCESS_KEY_ID`, `DDNS_PROVIDER_SECRET`: TrafficRoute credentials
// - `DDNS_PROVIDER_API_TOKEN`: Cloudflare API token
//
// ### Domains
// - `DDNS_IPV4_DOMAINS`: Comma-separated domains receiving A records
// - `DDNS_IPV6_DOMAINS`: Comma-separated domains receiving AAAA records
//
// ### Engine
// - `DDNS_TTL`: TTL for written records (default 600)
// - `DDNS_INTERVAL_SECS`: Seconds between passes (default 300)
// - `DDNS_RUN_ONCE`: Run a single pass and exit
// - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export DDNS_PROVIDER_TYPE=traffic_route
// export DDNS_PROVIDER_ACCESS_KEY_ID=AKLT...
// export DDNS_PROVIDER_SECRET=...
// export DDNS_IPV4_DOMAINS='home.example.com,nas.example.com?Line=telecom'
//
// ddns-syncd
// ```

use anyhow::{Context, Result};
use ddns_sync_core::config::{DdnsConfig, ProviderConfig, TtlSetting};
use ddns_sync_core::{EngineEvent, ProviderRegistry, Reconciler, transport};
use std::process::ExitCode;
use std::time::Duration;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
/// - 3: Single pass finished with failures
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// `DDNS_RUN_ONCE` pass had at least one failed domain
    PassFailed = 3,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration: the engine config plus process-level settings
#[derive(Debug)]
struct Config {
    ddns: DdnsConfig,
    log_level: String,
    run_once: bool,
}

impl Config {
    /// Load configuration from the process environment
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let mut ddns = match var("DDNS_CONFIG") {
            Some(path) => DdnsConfig::from_file(&path)
                .with_context(|| format!("failed to load DDNS_CONFIG file {}", path))?,
            None => DdnsConfig::new(provider_from_env(&var)?),
        };

        if var("DDNS_CONFIG").is_some() && var("DDNS_PROVIDER_TYPE").is_some() {
            ddns.provider = provider_from_env(&var)?;
        }
        if let Some(list) = var("DDNS_IPV4_DOMAINS") {
            ddns.domains.ipv4 = split_list(&list);
        }
        if let Some(list) = var("DDNS_IPV6_DOMAINS") {
            ddns.domains.ipv6 = split_list(&list);
        }
        if let Some(ttl) = var("DDNS_TTL") {
            ddns.ttl = Some(TtlSetting::Text(ttl));
        }
        if let Some(interval) = var("DDNS_INTERVAL_SECS") {
            ddns.engine.interval_secs = interval
                .trim()
                .parse()
                .with_context(|| format!("DDNS_INTERVAL_SECS is not a number: {}", interval))?;
        }

        Ok(Self {
            ddns,
            log_level: var("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            run_once: var("DDNS_RUN_ONCE").is_some_and(|v| is_truthy(&v)),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.ddns.validate()?;

        if self.ddns.engine.interval_secs == 0 {
            anyhow::bail!("DDNS_INTERVAL_SECS must be at least 1");
        }

        if self.ddns.ttl.is_some() && self.ddns.ttl.as_ref().and_then(TtlSetting::seconds).is_none()
        {
            eprintln!(
                "WARNING: TTL {:?} is not usable, falling back to {}",
                self.ddns.ttl,
                self.ddns.effective_ttl()
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

/// Build the provider section from `DDNS_PROVIDER_*` variables
fn provider_from_env(var: &impl Fn(&str) -> Option<String>) -> Result<ProviderConfig> {
    let provider_type = var("DDNS_PROVIDER_TYPE").unwrap_or_else(|| "traffic_route".to_string());

    match provider_type.as_str() {
        "traffic_route" | "trafficroute" => Ok(ProviderConfig::TrafficRoute {
            access_key_id: var("DDNS_PROVIDER_ACCESS_KEY_ID")
                .context("DDNS_PROVIDER_ACCESS_KEY_ID is required for traffic_route")?,
            secret_access_key: var("DDNS_PROVIDER_SECRET")
                .context("DDNS_PROVIDER_SECRET is required for traffic_route")?,
            region: None,
            endpoint: None,
        }),
        "cloudflare" => Ok(ProviderConfig::Cloudflare {
            api_token: var("DDNS_PROVIDER_API_TOKEN")
                .context("DDNS_PROVIDER_API_TOKEN is required for cloudflare")?,
        }),
        other => anyhow::bail!(
            "DDNS_PROVIDER_TYPE '{}' is not supported. \
            Supported providers: traffic_route, cloudflare",
            other
        ),
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddns-syncd");
    info!(
        "Configuration loaded: {} IPv4 and {} IPv6 domain(s), provider {}",
        config.ddns.domains.ipv4.len(),
        config.ddns.domains.ipv6.len(),
        config.ddns.provider.type_name()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DdnsExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Register every adapter compiled into this binary
fn register_builtins(registry: &ProviderRegistry) {
    #[cfg(feature = "trafficroute")]
    ddns_sync_provider_trafficroute::register(registry);

    #[cfg(feature = "cloudflare")]
    ddns_sync_provider_cloudflare::register(registry);

    #[cfg(feature = "http")]
    ddns_sync_ip_http::register(registry);

    info!(
        "Registered providers {:?}, IP sources {:?}",
        registry.list_providers(),
        registry.list_ip_sources()
    );
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<DdnsExitCode> {
    let Config { ddns, run_once, .. } = config;

    let client = transport::build_http_client(&ddns.transport)?;
    let registry = ProviderRegistry::new();
    register_builtins(&registry);

    let provider = registry.create_provider(&ddns.provider, client.clone())?;
    let ip_source = registry.create_ip_source(&ddns.ip_source, client)?;
    let (reconciler, mut events) = Reconciler::from_config(provider, ip_source, &ddns)?;
    let mut domains = ddns.domains.to_domain_set()?;

    info!(
        "Reconciling {} domain(s) via {} every {}s (ttl {})",
        domains.len(),
        reconciler.provider_name(),
        ddns.engine.interval_secs,
        ddns.effective_ttl()
    );

    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    if run_once {
        let report = reconciler.run_pass(&mut domains).await;
        drop(reconciler);
        let _ = event_logger.await;

        return Ok(if report.failures() > 0 {
            warn!("Single pass finished with {} failure(s)", report.failures());
            DdnsExitCode::PassFailed
        } else {
            DdnsExitCode::CleanShutdown
        });
    }

    let mut interval = tokio::time::interval(Duration::from_secs(ddns.engine.interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut ticks = IntervalStream::new(interval);

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    // A running pass completes before the shutdown signal is observed.
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                let signal = signal?;
                info!("Received shutdown signal: {}", signal);
                break;
            }
            tick = ticks.next() => {
                if tick.is_none() {
                    break;
                }
                reconciler.run_pass(&mut domains).await;
            }
        }
    }

    info!("Shutting down daemon");
    drop(reconciler);
    let _ = event_logger.await;

    Ok(DdnsExitCode::CleanShutdown)
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::PassStarted { record_type, ip } => {
            info!("{} pass started for {}", record_type, ip);
        }
        EngineEvent::PassSkipped {
            record_type,
            domains,
        } => {
            info!("{} pass skipped, {} domain(s) untouched", record_type, domains);
        }
        EngineEvent::DomainReconciled {
            domain,
            record_type,
            outcome,
        } => {
            if outcome.is_failure() {
                warn!("{} {}: {}", domain, record_type, outcome);
            } else {
                info!("{} {}: {}", domain, record_type, outcome);
            }
        }
        EngineEvent::PassFinished {
            record_type,
            succeeded,
            failed,
        } => {
            info!(
                "{} pass finished: {} succeeded, {} failed",
                record_type, succeeded, failed
            );
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
