// # IP Cache
//
// Remembers the last address a pass ran for, per record type, and decides
// whether the next pass for that type should run at all.
//
// ## Rules
//
// A pass runs when:
// - the address differs from the last one a pass ran for
// - the previous pass for this type had a failure
// - `force_update_every` unchanged checks have accumulated (0 disables this)
//
// Otherwise the type is skipped and its domains stay `NotSubmitted`.
//
// State is in-memory only; after a restart the first pass always runs.

/// Per-record-type pass gate
#[derive(Debug, Clone)]
pub struct IpCache {
    last_ip: Option<String>,
    unchanged_checks: u32,
    force_update_every: u32,
    failed: bool,
}

impl IpCache {
    /// Create an empty cache
    pub fn new(force_update_every: u32) -> Self {
        Self {
            last_ip: None,
            unchanged_checks: 0,
            force_update_every,
            failed: false,
        }
    }

    /// Decide whether a pass should run for `ip`
    ///
    /// Returns `true` and records `ip` when a pass should run. An empty
    /// address never runs.
    pub fn check(&mut self, ip: &str) -> bool {
        if ip.is_empty() {
            return false;
        }

        let changed = self.last_ip.as_deref() != Some(ip);
        let forced = self.force_update_every > 0
            && self.unchanged_checks + 1 >= self.force_update_every;

        if changed || self.failed || forced {
            self.last_ip = Some(ip.to_string());
            self.unchanged_checks = 0;
            self.failed = false;
            return true;
        }

        self.unchanged_checks += 1;
        false
    }

    /// Record the result of a pass that ran
    ///
    /// A failure makes the next check run regardless of the address.
    pub fn record_result(&mut self, had_failure: bool) {
        if had_failure {
            self.failed = true;
        }
    }

    /// Address of the last pass that ran
    pub fn last_ip(&self) -> Option<&str> {
        self.last_ip.as_deref()
    }
}
