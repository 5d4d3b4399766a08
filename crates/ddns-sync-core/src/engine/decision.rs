//! Reconciliation decision
//!
//! Pure mapping from the desired value and the records the provider already
//! has to the write actions for one domain and record type. No I/O.
//!
//! | existing records        | actions                                   |
//! |-------------------------|-------------------------------------------|
//! | none                    | one `Create`                              |
//! | value equal             | `NoOp` for that record                    |
//! | value different         | `Update` for that record                  |
//!
//! Records are never deleted, and nothing is created while records exist.

use crate::domain::{Domain, RecordType};
use crate::traits::{Record, RecordSpec};

/// What a domain should look like at the provider for one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    /// Host label (`@` for the apex)
    pub host: String,
    /// Record type
    pub record_type: RecordType,
    /// Desired address
    pub value: String,
    /// Configured TTL
    pub ttl: u32,
    /// Line the domain configures, if any
    pub line: Option<String>,
    /// Provider default line, used for creates when no line is configured
    pub default_line: String,
}

impl DesiredRecord {
    /// Build the desired record for a domain
    pub fn for_domain(
        domain: &Domain,
        record_type: RecordType,
        value: &str,
        ttl: u32,
        default_line: &str,
    ) -> Self {
        Self {
            host: domain.host().to_string(),
            record_type,
            value: value.to_string(),
            ttl,
            line: domain.line().map(str::to_string),
            default_line: default_line.to_string(),
        }
    }

    fn create_line(&self) -> &str {
        self.line.as_deref().unwrap_or(&self.default_line)
    }
}

/// One step of a domain's reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The record already holds the desired value
    NoOp(Record),
    /// Rewrite an existing record
    Update {
        /// The record as it should be written (identifier kept)
        record: Record,
        /// Value before the update
        previous_value: String,
    },
    /// Create a new record
    Create(RecordSpec),
}

impl Action {
    /// Whether this action calls the provider
    pub fn is_write(&self) -> bool {
        !matches!(self, Action::NoOp(_))
    }

    /// Short human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Action::NoOp(record) => format!("keep {} ({})", record.value, record.id),
            Action::Update {
                record,
                previous_value,
            } => format!("update {} -> {} ({})", previous_value, record.value, record.id),
            Action::Create(spec) => format!("create {} line {}", spec.value, spec.line),
        }
    }
}

/// Decide the actions for one domain and record type
///
/// `existing` must already be filtered to the domain's host and record type.
///
/// An `Update` keeps the record's identifier, host and type and applies the
/// configured TTL. It applies the configured line when the domain sets one
/// and keeps the record's own line otherwise, so records on distinct lines
/// stay distinct.
pub fn decide(desired: &DesiredRecord, existing: Vec<Record>) -> Vec<Action> {
    if existing.is_empty() {
        return vec![Action::Create(RecordSpec {
            host: desired.host.clone(),
            record_type: desired.record_type,
            line: desired.create_line().to_string(),
            ttl: desired.ttl,
            value: desired.value.clone(),
        })];
    }

    existing
        .into_iter()
        .map(|record| {
            if record.value == desired.value {
                return Action::NoOp(record);
            }

            let line = desired.line.clone().unwrap_or_else(|| record.line.clone());
            let previous_value = record.value;
            Action::Update {
                record: Record {
                    id: record.id,
                    host: record.host,
                    record_type: record.record_type,
                    line,
                    ttl: desired.ttl,
                    value: desired.value.clone(),
                },
                previous_value,
            }
        })
        .collect()
}
