//! Volcengine HMAC-SHA256 request signing

use chrono::{DateTime, Utc};
use ddns_sync_core::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::{CONTENT_TYPE, TRAFFIC_ROUTE_SERVICE};

const ALGORITHM: &str = "HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-content-sha256;x-date";

/// Headers a signed request must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedHeaders {
    pub x_date: String,
    pub content_sha256: String,
    pub authorization: String,
}

/// Holds the credentials; `Debug` never shows the secret
pub(crate) struct Signer {
    access_key_id: String,
    secret_access_key: String,
    region: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field("region", &self.region)
            .finish()
    }
}

impl Signer {
    pub(crate) fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    pub(crate) fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub(crate) fn region(&self) -> &str {
        &self.region
    }

    /// Sign one request
    ///
    /// `canonical_query` must be the exact query string sent on the wire,
    /// as produced by [`canonical_query`].
    pub(crate) fn sign(
        &self,
        method: &str,
        host: &str,
        canonical_query: &str,
        payload: &str,
        timestamp: i64,
    ) -> Result<SignedHeaders> {
        let now = DateTime::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
        let x_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let short_date = now.format("%Y%m%d").to_string();

        let content_sha256 = hex::encode(Sha256::digest(payload.as_bytes()));
        let canonical_headers = format!(
            "content-type:{CONTENT_TYPE}\nhost:{host}\nx-content-sha256:{content_sha256}\nx-date:{x_date}\n"
        );
        let canonical_request = format!(
            "{method}\n/\n{canonical_query}\n{canonical_headers}\n{SIGNED_HEADERS}\n{content_sha256}"
        );

        let credential_scope = format!(
            "{short_date}/{}/{TRAFFIC_ROUTE_SERVICE}/request",
            self.region
        );
        let hashed_canonical_request = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign =
            format!("{ALGORITHM}\n{x_date}\n{credential_scope}\n{hashed_canonical_request}");

        let k_date = hmac_sha256(self.secret_access_key.as_bytes(), short_date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, TRAFFIC_ROUTE_SERVICE.as_bytes())?;
        let k_signing = hmac_sha256(&k_service, b"request")?;
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

        Ok(SignedHeaders {
            x_date,
            content_sha256,
            authorization: format!(
                "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
                self.access_key_id
            ),
        })
    }
}

/// Query string with keys sorted and every component percent-encoded
pub(crate) fn canonical_query(params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| Error::signing(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
