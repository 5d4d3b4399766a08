//! Core traits for the DDNS sync engine
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ProviderAdapter`]: Zone/record listing and writes at a DNS vendor
//! - [`IpSource`]: Current public address per record type

pub mod ip_source;
pub mod provider;

pub use ip_source::{IpSource, IpSourceFactory};
pub use provider::{ProviderAdapter, ProviderAdapterFactory, Record, RecordSpec, WriteOutcome, Zone};
