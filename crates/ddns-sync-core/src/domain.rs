//! Managed domains and the per-pass data model
//!
//! A [`Domain`] is sourced from configuration and survives across passes.
//! The engine only ever touches its [`UpdateStatus`], and only through the
//! status tracker.
//!
//! ## Notation
//!
//! Domains are configured as strings:
//!
//! ```text
//! sub.example.com                  root = example.com, host = sub
//! example.com                      root = example.com, host = @
//! a.b:example.com                  explicit split, host = a.b
//! www.example.com.cn               root = example.com.cn (known suffix)
//! sub.example.com?Line=telecom     custom params (percent-decoded)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// Custom parameter naming the routing line
pub const PARAM_LINE: &str = "Line";

/// Custom parameter carrying a record comment
pub const PARAM_COMMENT: &str = "Comment";

/// Two-label public suffixes under which the root domain spans three labels
const COMPOUND_SUFFIXES: &[&str] = &[
    "com.cn", "net.cn", "org.cn", "gov.cn", "edu.cn", "ac.cn", "com.hk", "com.tw", "co.uk",
    "org.uk", "me.uk", "co.jp", "ne.jp", "or.jp", "com.au", "net.au", "org.au", "co.nz",
    "com.br", "co.kr", "com.sg", "eu.org",
];

/// DNS record type managed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Pass order: A first, then AAAA
    pub const ALL: [RecordType; 2] = [RecordType::A, RecordType::Aaaa];

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Parse a vendor's record type string; anything but A/AAAA is `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            _ => None,
        }
    }

    /// Whether `ip` belongs to this record type's address family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        matches!(
            (self, ip),
            (RecordType::A, IpAddr::V4(_)) | (RecordType::Aaaa, IpAddr::V6(_))
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-visible status of a domain for the latest pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// Not reconciled in this pass (skipped or not yet processed)
    #[default]
    NotSubmitted,
    /// Every action was a no-op or succeeded
    Success,
    /// At least one step failed
    Failed,
}

/// Desired address for one record type
///
/// An empty `ip` means there is no usable address this pass and the whole
/// record type is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredValue {
    /// Record type this value applies to
    pub record_type: RecordType,
    /// The address, or empty to skip
    pub ip: String,
}

impl DesiredValue {
    /// Desired value for an address
    pub fn new(record_type: RecordType, ip: impl Into<String>) -> Self {
        Self {
            record_type,
            ip: ip.into(),
        }
    }

    /// A value that skips the record type for this pass
    pub fn skip(record_type: RecordType) -> Self {
        Self::new(record_type, String::new())
    }

    /// Whether this pass should skip the record type
    pub fn is_skip(&self) -> bool {
        self.ip.is_empty()
    }
}

/// A DNS name managed by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    /// Root domain in ASCII form (e.g. `example.com`)
    pub domain_name: String,
    /// Host part in ASCII form, empty for the apex
    pub sub_domain: String,
    /// Custom per-domain parameters (`Line`, `Comment`, ...)
    pub custom_params: BTreeMap<String, String>,
    /// Record types this domain is managed for
    pub record_types: Vec<RecordType>,
    /// Status of the latest pass
    pub update_status: UpdateStatus,
}

impl Domain {
    /// Create a domain from an already-split root and host part
    pub fn new(domain_name: impl Into<String>, sub_domain: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            sub_domain: sub_domain.into(),
            custom_params: BTreeMap::new(),
            record_types: Vec::new(),
            update_status: UpdateStatus::NotSubmitted,
        }
    }

    /// Parse the configuration notation described in the module docs
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::invalid_input("Domain cannot be empty"));
        }

        let (name, query) = match input.split_once('?') {
            Some((name, query)) => (name, Some(query)),
            None => (input, None),
        };

        let (sub_domain, domain_name) = match name.split_once(':') {
            Some((sub, root)) => {
                let root = to_ascii(root)?;
                if root.is_empty() {
                    return Err(Error::invalid_input(format!(
                        "Root domain missing in '{}'",
                        input
                    )));
                }
                let sub = if sub.is_empty() {
                    String::new()
                } else {
                    to_ascii(sub)?
                };
                (sub, root)
            }
            None => split_root(&to_ascii(name)?)?,
        };

        let mut domain = Self::new(domain_name, sub_domain);
        if let Some(query) = query {
            domain.custom_params = parse_params(query)?;
        }
        Ok(domain)
    }

    /// Add a custom parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_params.insert(key.into(), value.into());
        self
    }

    /// Manage this domain for a record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        if !self.record_types.contains(&record_type) {
            self.record_types.push(record_type);
        }
        self
    }

    /// Whether this domain takes part in passes for `record_type`
    pub fn manages(&self, record_type: RecordType) -> bool {
        self.record_types.contains(&record_type)
    }

    /// Host label as providers expect it (`@` for the apex)
    pub fn host(&self) -> &str {
        if self.sub_domain.is_empty() {
            "@"
        } else {
            &self.sub_domain
        }
    }

    /// Fully qualified name in ASCII form
    pub fn fqdn(&self) -> String {
        if self.sub_domain.is_empty() {
            self.domain_name.clone()
        } else {
            format!("{}.{}", self.sub_domain, self.domain_name)
        }
    }

    /// Look up a custom parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.custom_params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Routing line configured for this domain, if any
    pub fn line(&self) -> Option<&str> {
        self.param(PARAM_LINE)
    }

    /// Identity used to merge the IPv4 and IPv6 lists of the configuration
    fn same_target(&self, other: &Domain) -> bool {
        self.domain_name == other.domain_name
            && self.sub_domain == other.sub_domain
            && self.custom_params == other.custom_params
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqdn())
    }
}

/// The full set of managed domains
///
/// A name listed for both IPv4 and IPv6 (with identical params) becomes a
/// single [`Domain`] managed for both record types, so its status combines
/// both passes.
#[derive(Debug, Clone, Default)]
pub struct DomainSet {
    domains: Vec<Domain>,
}

impl DomainSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from the configured IPv4/IPv6 domain lists
    pub fn from_lists(ipv4: &[String], ipv6: &[String]) -> Result<Self> {
        let mut set = Self::new();
        for (record_type, list) in [(RecordType::A, ipv4), (RecordType::Aaaa, ipv6)] {
            for entry in list.iter().filter(|e| !e.trim().is_empty()) {
                set.insert(Domain::parse(entry)?.with_record_type(record_type));
            }
        }
        Ok(set)
    }

    /// Insert a domain, merging record types into an existing identical entry
    pub fn insert(&mut self, domain: Domain) {
        if let Some(existing) = self.domains.iter_mut().find(|d| d.same_target(&domain)) {
            for record_type in domain.record_types {
                if !existing.record_types.contains(&record_type) {
                    existing.record_types.push(record_type);
                }
            }
        } else {
            self.domains.push(domain);
        }
    }

    /// All domains
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// All domains, mutably (statuses are written by the status tracker)
    pub fn domains_mut(&mut self) -> &mut [Domain] {
        &mut self.domains
    }

    /// Indices of the domains managed for `record_type`
    pub fn eligible(&self, record_type: RecordType) -> Vec<usize> {
        self.domains
            .iter()
            .enumerate()
            .filter(|(_, d)| d.manages(record_type))
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

fn to_ascii(name: &str) -> Result<String> {
    let name = name.trim().trim_end_matches('.');
    if name.is_ascii() {
        return Ok(name.to_ascii_lowercase());
    }
    idna::domain_to_ascii(name)
        .map_err(|_| Error::invalid_input(format!("Invalid domain name: {}", name)))
}

fn split_root(name: &str) -> Result<(String, String)> {
    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(Error::invalid_input(format!(
            "Cannot determine root domain of '{}'",
            name
        )));
    }

    let n = labels.len();
    let last_two = format!("{}.{}", labels[n - 2], labels[n - 1]);
    let root_labels = if n >= 3 && COMPOUND_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };

    let root = labels[n - root_labels..].join(".");
    let sub = labels[..n - root_labels].join(".");
    Ok((sub, root))
}

fn parse_params(query: &str) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(key)
            .map_err(|e| Error::invalid_input(format!("Invalid parameter name '{}': {}", key, e)))?;
        let value = urlencoding::decode(value).map_err(|e| {
            Error::invalid_input(format!("Invalid parameter value '{}': {}", value, e))
        })?;
        params.insert(key.into_owned(), value.into_owned());
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subdomain_against_two_label_root() {
        let d = Domain::parse("sub.example.com").unwrap();
        assert_eq!(d.domain_name, "example.com");
        assert_eq!(d.sub_domain, "sub");
        assert_eq!(d.host(), "sub");
        assert_eq!(d.fqdn(), "sub.example.com");
    }

    #[test]
    fn apex_uses_at_sign_host() {
        let d = Domain::parse("example.com").unwrap();
        assert_eq!(d.host(), "@");
        assert_eq!(d.fqdn(), "example.com");
    }

    #[test]
    fn compound_suffix_keeps_three_labels() {
        let d = Domain::parse("www.example.com.cn").unwrap();
        assert_eq!(d.domain_name, "example.com.cn");
        assert_eq!(d.sub_domain, "www");
    }

    #[test]
    fn explicit_split_with_colon() {
        let d = Domain::parse("a.b:example.co").unwrap();
        assert_eq!(d.domain_name, "example.co");
        assert_eq!(d.sub_domain, "a.b");

        let apex = Domain::parse(":example.co").unwrap();
        assert_eq!(apex.host(), "@");
    }

    #[test]
    fn custom_params_are_percent_decoded() {
        let d = Domain::parse("sub.example.com?Line=%E7%94%B5%E4%BF%A1&Comment=home").unwrap();
        assert_eq!(d.line(), Some("电信"));
        assert_eq!(d.param(PARAM_COMMENT), Some("home"));
    }

    #[test]
    fn empty_line_param_counts_as_unset() {
        let d = Domain::parse("sub.example.com?Line=").unwrap();
        assert_eq!(d.line(), None);
    }

    #[test]
    fn unicode_names_become_punycode() {
        let d = Domain::parse("www.例子.com").unwrap();
        assert_eq!(d.domain_name, "xn--fsqu00a.com");
        assert_eq!(d.sub_domain, "www");
    }

    #[test]
    fn rejects_single_label_and_empty_input() {
        assert!(Domain::parse("localhost").is_err());
        assert!(Domain::parse("   ").is_err());
        assert!(Domain::parse("a..com").is_err());
    }

    #[test]
    fn domain_set_merges_identical_entries_across_lists() {
        let set = DomainSet::from_lists(
            &["sub.example.com".to_string(), "v4only.example.com".to_string()],
            &["sub.example.com".to_string()],
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        let sub = &set.domains()[0];
        assert!(sub.manages(RecordType::A));
        assert!(sub.manages(RecordType::Aaaa));
        assert_eq!(set.eligible(RecordType::Aaaa), vec![0]);
        assert_eq!(set.eligible(RecordType::A), vec![0, 1]);
    }

    #[test]
    fn domain_set_keeps_entries_with_different_params_apart() {
        let set = DomainSet::from_lists(
            &["sub.example.com?Line=telecom".to_string()],
            &["sub.example.com".to_string()],
        )
        .unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn record_type_matches_address_family() {
        let v4: IpAddr = "1.2.3.4".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        assert!(RecordType::A.matches(&v4));
        assert!(!RecordType::A.matches(&v6));
        assert!(RecordType::Aaaa.matches(&v6));
        assert_eq!(RecordType::parse("aaaa"), Some(RecordType::Aaaa));
        assert_eq!(RecordType::parse("CNAME"), None);
    }

    #[test]
    fn desired_value_skip_is_empty() {
        assert!(DesiredValue::skip(RecordType::A).is_skip());
        assert!(!DesiredValue::new(RecordType::A, "1.2.3.4").is_skip());
    }
}
