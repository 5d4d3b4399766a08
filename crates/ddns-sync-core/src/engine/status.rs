//! Per-domain outcomes and the status tracker
//!
//! Every domain reconciliation ends in exactly one [`ReconciliationOutcome`].
//! The tracker is the only writer of [`Domain::update_status`]:
//!
//! - at pass start every status is reset to `NotSubmitted`
//! - a skipped record type leaves the status alone
//! - any failure sets `Failed`, and `Failed` stays for the rest of the pass
//! - a success sets `Success` unless an earlier record type already failed

use std::fmt;

use crate::domain::{Domain, UpdateStatus};
use crate::engine::decision::Action;

/// An action together with what happened when it was carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    /// The action
    pub action: Action,
    /// Failure reason, `None` if the action succeeded or was a no-op
    pub error: Option<String>,
}

impl ActionResult {
    /// A successful (or no-op) action
    pub fn ok(action: Action) -> Self {
        Self {
            action,
            error: None,
        }
    }

    /// A failed action
    pub fn failed(action: Action, reason: impl Into<String>) -> Self {
        Self {
            action,
            error: Some(reason.into()),
        }
    }

    /// Whether the action succeeded (no-ops always do)
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// How one domain's reconciliation for one record type ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// No usable address this pass; nothing was called
    Skipped,
    /// The provider hosts no zone for the root domain
    ZoneNotFound(String),
    /// The zone lookup itself failed
    ZoneLookupFailed(String),
    /// Listing the existing records failed
    ListFailed(String),
    /// Every record already held the desired value
    NoChange,
    /// A record was created
    Created,
    /// Records were updated (no-ops may be mixed in)
    Updated {
        /// Number of records rewritten
        count: usize,
    },
    /// At least one write failed; earlier successful writes are not rolled back
    ActionFailed {
        /// Joined failure reasons
        reason: String,
        /// Writes that did succeed
        applied: usize,
    },
}

impl ReconciliationOutcome {
    /// Derive the outcome from the results of a domain's actions
    pub fn from_actions(results: &[ActionResult]) -> Self {
        let failures: Vec<&str> = results.iter().filter_map(|r| r.error.as_deref()).collect();
        let applied = results
            .iter()
            .filter(|r| r.succeeded() && r.action.is_write())
            .count();

        if !failures.is_empty() {
            return ReconciliationOutcome::ActionFailed {
                reason: failures.join("; "),
                applied,
            };
        }

        if results.iter().any(|r| matches!(r.action, Action::Create(_))) {
            ReconciliationOutcome::Created
        } else if applied > 0 {
            ReconciliationOutcome::Updated { count: applied }
        } else {
            ReconciliationOutcome::NoChange
        }
    }

    /// Whether this outcome marks the domain `Failed`
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ReconciliationOutcome::ZoneNotFound(_)
                | ReconciliationOutcome::ZoneLookupFailed(_)
                | ReconciliationOutcome::ListFailed(_)
                | ReconciliationOutcome::ActionFailed { .. }
        )
    }

    /// Whether the provider was written to
    pub fn wrote(&self) -> bool {
        match self {
            ReconciliationOutcome::Created | ReconciliationOutcome::Updated { .. } => true,
            ReconciliationOutcome::ActionFailed { applied, .. } => *applied > 0,
            _ => false,
        }
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationOutcome::Skipped => write!(f, "skipped"),
            ReconciliationOutcome::ZoneNotFound(root) => {
                write!(f, "no zone for root domain {}", root)
            }
            ReconciliationOutcome::ZoneLookupFailed(reason) => {
                write!(f, "zone lookup failed: {}", reason)
            }
            ReconciliationOutcome::ListFailed(reason) => {
                write!(f, "listing records failed: {}", reason)
            }
            ReconciliationOutcome::NoChange => write!(f, "no change"),
            ReconciliationOutcome::Created => write!(f, "created"),
            ReconciliationOutcome::Updated { count } => write!(f, "updated {} record(s)", count),
            ReconciliationOutcome::ActionFailed { reason, applied } => {
                write!(f, "failed after {} write(s): {}", applied, reason)
            }
        }
    }
}

/// Sole writer of domain statuses
pub struct StatusTracker;

impl StatusTracker {
    /// Reset every status at the start of a pass
    pub fn begin_pass(domains: &mut [Domain]) {
        for domain in domains {
            domain.update_status = UpdateStatus::NotSubmitted;
        }
    }

    /// Fold one outcome into a domain's status
    pub fn apply(domain: &mut Domain, outcome: &ReconciliationOutcome) {
        if matches!(outcome, ReconciliationOutcome::Skipped) {
            return;
        }

        if outcome.is_failure() {
            domain.update_status = UpdateStatus::Failed;
        } else if domain.update_status != UpdateStatus::Failed {
            domain.update_status = UpdateStatus::Success;
        }
    }
}
